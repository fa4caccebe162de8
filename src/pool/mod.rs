//! The size-classed buffer pool.
//!
//! - [`BufferPool`] - Lends and reclaims [`GrowableBuffer`]s per size class
//! - [`PoolKey`] - Queue identifier derived from a normalized capacity
//! - [`PoolStatistics`] - Snapshot of counters and idle queues
//!
//! A pool is plain owned state with no internal locking. Give each worker
//! its own pool (see [`with_local_pool`](crate::with_local_pool)) or wrap a
//! shared one in a mutex.
//!
//! # Example
//!
//! ```
//! use jsonpool::BufferPool;
//! use serde_json::json;
//!
//! let mut pool = BufferPool::new();
//! let value = json!({"id": 7, "tags": ["a", "b"]});
//!
//! let text = pool.encode_with_pool(&value)?;
//! assert_eq!(text, serde_json::to_string(&value)?);
//!
//! let stats = pool.statistics();
//! assert_eq!(stats.total_operations, 1);
//! assert_eq!(stats.total_buffers_pooled, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod size_class;
mod stats;

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::Serialize;

use crate::buffer::GrowableBuffer;
use crate::config::{PoolConfig, PoolConfigPatch};
use crate::error::PoolError;
use crate::estimate::optimal_capacity;

pub use size_class::{PoolKey, format_capacity, normalize_capacity};
pub use stats::{PoolStatistics, SizeClassStats, UsageCounters};

/// A registry of idle [`GrowableBuffer`] queues keyed by size class.
///
/// Requests are rounded up to a power of two so nearby sizes share one
/// queue. A lent buffer belongs to the caller until it is handed back with
/// [`BufferPool::return_buffer`]; buffers that are never returned are simply
/// not reused.
#[derive(Debug, Default)]
pub struct BufferPool {
    config: PoolConfig,
    queues: BTreeMap<PoolKey, Vec<GrowableBuffer>>,
    counters: UsageCounters,
    next_id: u64,
}

impl BufferPool {
    /// Creates a pool with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool with the given configuration.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Returns the lend/return counters.
    pub fn counters(&self) -> &UsageCounters {
        &self.counters
    }

    /// Lends a buffer of the configured default capacity.
    pub fn get_default_buffer(&mut self) -> GrowableBuffer {
        self.get_buffer(self.config.default_capacity())
    }

    /// Lends a buffer whose capacity is `capacity` rounded up to its size
    /// class, reusing an idle one when available.
    pub fn get_buffer(&mut self, capacity: usize) -> GrowableBuffer {
        let key = PoolKey::for_capacity(capacity);

        if let Some(buffer) = self.queues.get_mut(&key).and_then(Vec::pop) {
            self.counters.record_reuse();
            tracing::trace!(%key, id = buffer.id(), "reusing pooled buffer");
            return buffer;
        }

        self.counters.record_allocation();
        self.next_id += 1;
        tracing::trace!(%key, id = self.next_id, "allocating buffer");
        GrowableBuffer::with_stream_threshold(key.capacity(), self.config.stream_threshold())
            .with_id(self.next_id)
    }

    /// Lends a buffer sized by the named size category.
    ///
    /// Returns `None` if no such category is configured.
    pub fn get_buffer_for_category(&mut self, label: &str) -> Option<GrowableBuffer> {
        let capacity = self.config.size_categories().get(label)?;
        Some(self.get_buffer(capacity))
    }

    /// Takes a buffer back.
    ///
    /// The buffer is reset under the current stream threshold and queued
    /// under the size class it was created for. If that queue is already at
    /// `max_pool_size` the buffer is dropped instead.
    pub fn return_buffer(&mut self, mut buffer: GrowableBuffer) {
        buffer.reset_with_threshold(self.config.stream_threshold());
        self.counters.record_return();

        let key = buffer.pool_key();
        let queue = self.queues.entry(key).or_default();
        if queue.len() < self.config.max_pool_size() {
            tracing::trace!(%key, id = buffer.id(), "buffer returned to pool");
            queue.push(buffer);
        } else {
            tracing::debug!(
                %key,
                id = buffer.id(),
                max_pool_size = self.config.max_pool_size(),
                "pool full, discarding buffer"
            );
        }
    }

    /// Lends a buffer for the duration of `f` and always takes it back.
    pub fn with_buffer<R, F>(&mut self, capacity: usize, f: F) -> R
    where
        F: FnOnce(&mut GrowableBuffer) -> R,
    {
        let mut buffer = self.get_buffer(capacity);
        let result = f(&mut buffer);
        self.return_buffer(buffer);
        result
    }

    /// Returns the capacity [`BufferPool::encode_with_pool`] would request
    /// for `value` under the current size categories.
    pub fn optimal_capacity<T: Serialize + ?Sized>(&self, value: &T) -> usize {
        optimal_capacity(value, self.config.size_categories())
    }

    /// Serializes `value` to a JSON string using a pooled buffer.
    ///
    /// The output is byte-identical to `serde_json::to_string(value)`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Encoding`] if `value` cannot be serialized. The
    /// buffer is returned to the pool either way.
    pub fn encode_with_pool<T>(&mut self, value: &T) -> Result<String, PoolError>
    where
        T: Serialize + ?Sized,
    {
        let capacity = self.optimal_capacity(value);
        self.with_buffer(capacity, |buffer| {
            buffer.append_json(value)?;
            Ok(buffer.finalize())
        })
    }

    /// Like [`BufferPool::encode_with_pool`], returning bytes.
    pub fn encode_to_bytes<T>(&mut self, value: &T) -> Result<Bytes, PoolError>
    where
        T: Serialize + ?Sized,
    {
        let capacity = self.optimal_capacity(value);
        self.with_buffer(capacity, |buffer| {
            buffer.append_json(value)?;
            Ok(buffer.finalize_bytes())
        })
    }

    /// Returns a snapshot of counters and idle queues.
    pub fn statistics(&self) -> PoolStatistics {
        let size_classes = self
            .queues
            .iter()
            .map(|(key, queue)| SizeClassStats {
                key: key.to_string(),
                capacity_bytes: key.capacity(),
                capacity_label: format_capacity(key.capacity()),
                buffers_available: queue.len(),
            })
            .collect();
        PoolStatistics::new(self.counters, size_classes)
    }

    /// Merges `patch` into the configuration.
    ///
    /// Idle buffers pick up a new stream threshold on their next return;
    /// lent buffers keep theirs until then. Queues above a lowered
    /// `max_pool_size` are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the patch is rejected; the
    /// configuration is then unchanged.
    pub fn configure(&mut self, patch: PoolConfigPatch) -> Result<(), PoolError> {
        self.config.apply(patch)?;
        tracing::debug!(config = ?self.config, "pool reconfigured");
        self.trim_queues();
        Ok(())
    }

    /// Restores the built-in configuration. Idle buffers and counters are
    /// kept.
    pub fn reset_configuration(&mut self) {
        self.config = PoolConfig::default();
        tracing::debug!("pool configuration reset to defaults");
        self.trim_queues();
    }

    /// Drops all idle buffers and zeroes the counters.
    pub fn clear_pools(&mut self) {
        let dropped: usize = self.queues.values().map(Vec::len).sum();
        self.queues.clear();
        self.counters = UsageCounters::default();
        tracing::debug!(dropped, "pools cleared");
    }

    fn trim_queues(&mut self) {
        let cap = self.config.max_pool_size();
        for (key, queue) in &mut self.queues {
            if queue.len() > cap {
                tracing::debug!(%key, dropped = queue.len() - cap, "trimming pool");
                queue.truncate(cap);
            }
        }
    }
}
