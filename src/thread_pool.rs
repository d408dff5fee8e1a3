//! Shared thread pool for running outer replicates.
//!
//! Estimator fits can recurse deeply (tree growing), so the pool uses a
//! larger stack than rayon's default.

#[cfg(feature = "parallel")]
use rayon::ThreadPool;

#[cfg(feature = "parallel")]
use std::sync::OnceLock;

#[cfg(feature = "parallel")]
static THREAD_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

/// Get or initialize the shared thread pool.
///
/// The thread pool is configured with:
/// - Stack size: 8 MB (vs rayon's default 2 MB)
/// - Thread count: Number of logical CPUs
///
/// Returns `None` if the pool could not be built; callers then fall back to
/// rayon's global pool.
#[cfg(feature = "parallel")]
pub fn get_thread_pool() -> Option<&'static ThreadPool> {
    THREAD_POOL
        .get_or_init(|| {
            rayon::ThreadPoolBuilder::new()
                .stack_size(8 * 1024 * 1024)
                .thread_name(|i| format!("fairness-cookbook-{}", i))
                .build()
                .map_err(|e| tracing::warn!(error = %e, "falling back to the global rayon pool"))
                .ok()
        })
        .as_ref()
}

/// Execute a parallel operation using the shared thread pool.
#[cfg(feature = "parallel")]
pub fn install<OP, R>(op: OP) -> R
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    match get_thread_pool() {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

/// Execute `op` on the calling thread.
#[cfg(not(feature = "parallel"))]
pub fn install<OP, R>(op: OP) -> R
where
    OP: FnOnce() -> R,
{
    op()
}
