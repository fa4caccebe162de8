//! Per-thread buffer pool.
//!
//! One [`BufferPool`] per thread, for hosts that run one request per worker
//! thread and do not want to pass a pool around.

use std::cell::RefCell;

use crate::pool::BufferPool;

thread_local! {
    static LOCAL_POOL: RefCell<BufferPool> = RefCell::new(BufferPool::new());
}

/// Runs `f` with this thread's pool.
///
/// # Panics
///
/// Panics if called again from inside `f` on the same thread.
///
/// # Example
///
/// ```
/// use jsonpool::with_local_pool;
///
/// let text = with_local_pool(|pool| pool.encode_with_pool(&vec![1, 2, 3]))?;
/// assert_eq!(text, "[1,2,3]");
/// # Ok::<(), jsonpool::PoolError>(())
/// ```
pub fn with_local_pool<R, F>(f: F) -> R
where
    F: FnOnce(&mut BufferPool) -> R,
{
    LOCAL_POOL.with_borrow_mut(f)
}
