//! jsonpool
//!
//! Pooled buffers for JSON serialization.
//!
//! `jsonpool` keeps a size-classed pool of reusable, growable byte buffers
//! and picks a starting size for each payload from its shape. It is a small
//! primitive for hot serialization paths such as:
//!
//! - HTTP response bodies
//! - message queue payloads
//! - log and event records
//!
//! The crate intentionally:
//! - does NOT lock (one pool per worker, or wrap it yourself)
//! - does NOT share buffers across processes
//! - does NOT perform I/O
//!
//! It only does one thing: **value in → JSON out, with fewer allocations**
//!
//! # Encoding
//!
//! ```
//! use jsonpool::BufferPool;
//! use serde_json::json;
//!
//! let mut pool = BufferPool::new();
//! let value = json!({"user": "ana", "roles": ["admin", "dev"]});
//!
//! let text = pool.encode_with_pool(&value)?;
//! assert_eq!(text, r#"{"roles":["admin","dev"],"user":"ana"}"#);
//! # Ok::<(), jsonpool::PoolError>(())
//! ```
//!
//! # Borrowing a buffer
//!
//! ```
//! use jsonpool::BufferPool;
//!
//! let mut pool = BufferPool::new();
//! let mut buf = pool.get_buffer(1000);
//! assert_eq!(buf.capacity(), 1024);
//!
//! buf.append("{\"items\":");
//! buf.append_json(&[1, 2, 3])?;
//! buf.append("}");
//! assert_eq!(buf.finalize(), r#"{"items":[1,2,3]}"#);
//!
//! pool.return_buffer(buf);
//! assert_eq!(pool.statistics().total_buffers_pooled, 1);
//! # Ok::<(), jsonpool::PoolError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod config;
mod error;
mod estimate;
mod local;
mod pool;

//
// Public surface
//

pub use buffer::{BufferMode, GrowableBuffer};
pub use config::{
    DEFAULT_CAPACITY, DEFAULT_MAX_POOL_SIZE, DEFAULT_SIZE_CATEGORIES, DEFAULT_STREAM_THRESHOLD,
    PoolConfig, PoolConfigPatch, SizeCategories,
};
pub use error::PoolError;
pub use estimate::{Shape, estimate, optimal_capacity};
pub use local::with_local_pool;
pub use pool::{
    BufferPool, PoolKey, PoolStatistics, SizeClassStats, UsageCounters, format_capacity,
    normalize_capacity,
};
