//! Usage counters and statistics snapshots.

use std::collections::BTreeMap;

use serde::Serialize;

/// Lend/return counters of a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounters {
    /// Buffers constructed because no idle buffer was available.
    pub allocations: u64,
    /// Buffers lent out of an idle queue.
    pub reuses: u64,
    /// Buffers currently lent out.
    pub current_usage: usize,
    /// Highest `current_usage` observed.
    pub peak_usage: usize,
}

impl UsageCounters {
    /// Returns `allocations + reuses`.
    pub fn total_operations(&self) -> u64 {
        self.allocations + self.reuses
    }

    /// Returns the share of requests served from an idle queue, in percent.
    ///
    /// 0 when nothing has been requested yet.
    pub fn reuse_rate(&self) -> f64 {
        match self.total_operations() {
            0 => 0.0,
            total => self.reuses as f64 / total as f64 * 100.0,
        }
    }

    pub(crate) fn record_allocation(&mut self) {
        self.allocations += 1;
        self.record_lend();
    }

    pub(crate) fn record_reuse(&mut self) {
        self.reuses += 1;
        self.record_lend();
    }

    pub(crate) fn record_return(&mut self) {
        self.current_usage = self.current_usage.saturating_sub(1);
    }

    fn record_lend(&mut self) {
        self.current_usage += 1;
        self.peak_usage = self.peak_usage.max(self.current_usage);
    }
}

/// Idle buffers held for one size class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeClassStats {
    /// Queue identifier, e.g. `pool_4096`.
    pub key: String,
    /// Normalized capacity of the class.
    pub capacity_bytes: usize,
    /// Human-readable capacity, e.g. `4.0KB (4096 bytes)`.
    pub capacity_label: String,
    /// Idle buffers ready to be lent.
    pub buffers_available: usize,
}

/// Read-only snapshot of a pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatistics {
    /// Raw counters.
    #[serde(flatten)]
    pub counters: UsageCounters,
    /// See [`UsageCounters::reuse_rate`].
    pub reuse_rate: f64,
    /// See [`UsageCounters::total_operations`].
    pub total_operations: u64,
    /// Idle buffers across all classes.
    pub total_buffers_pooled: usize,
    /// Classes with at least one idle buffer.
    pub active_size_classes: usize,
    /// Idle buffers keyed by capacity label.
    pub buffers_by_size: BTreeMap<String, usize>,
    /// Per-class detail, ascending by capacity.
    pub size_classes: Vec<SizeClassStats>,
}

impl PoolStatistics {
    pub(crate) fn new(counters: UsageCounters, size_classes: Vec<SizeClassStats>) -> Self {
        let buffers_by_size = size_classes
            .iter()
            .map(|class| (class.capacity_label.clone(), class.buffers_available))
            .collect();
        Self {
            counters,
            reuse_rate: counters.reuse_rate(),
            total_operations: counters.total_operations(),
            total_buffers_pooled: size_classes.iter().map(|c| c.buffers_available).sum(),
            active_size_classes: size_classes
                .iter()
                .filter(|c| c.buffers_available > 0)
                .count(),
            buffers_by_size,
            size_classes,
        }
    }
}
