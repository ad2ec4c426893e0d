// src/core/blocking.rs

//! The bounded pool reserved for user-initiated blocking work invoked from
//! handler bodies (§5): "A bounded worker pool (`n_threads`, default 4) is
//! reserved for user-initiated blocking work invoked from handlers; it is
//! not in the packet-dispatch critical path." SPEC_FULL.md's implementation
//! note maps this onto `tokio::task::spawn_blocking`, bounded by a
//! `Semaphore` the same way `JobQueue::has_jobs` bounds queue depth — a
//! handler that calls `BlockingPool::run` waits for a permit rather than
//! spawning unboundedly, so a burst of slow handlers can't starve the
//! runtime's own blocking-thread budget.

use tokio::sync::Semaphore;
use tokio::task::JoinError;

use crate::core::errors::CerverError;

/// Sized by `Config::worker_pool_size` at `CerverState::initialize` time.
/// Independent of the per-handler `JobQueue` workers (§4.5) and of the
/// readiness-loop tasks — this pool exists only for blocking work a handler
/// body chooses to offload, and sits outside the dispatch critical path.
pub struct BlockingPool {
    permits: Semaphore,
}

impl BlockingPool {
    pub fn new(n_threads: usize) -> Self {
        Self {
            permits: Semaphore::new(n_threads.max(1)),
        }
    }

    /// Acquires a permit, runs `f` on the blocking thread pool, and returns
    /// its result. Waits for a free slot rather than spawning past
    /// `n_threads` concurrent blocking calls. The permit is held for the
    /// lifetime of the `spawn_blocking` task, including the wait for a
    /// slot in tokio's own blocking pool, so `n_threads` is an upper bound
    /// on concurrently *running* blocking closures, not just queued ones.
    pub async fn run<F, R>(&self, f: F) -> Result<R, CerverError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CerverError::Internal("blocking pool closed".to_string()))?;
        let result = tokio::task::spawn_blocking(f).await;
        drop(permit);
        result.map_err(join_error)
    }
}

fn join_error(e: JoinError) -> CerverError {
    if e.is_panic() {
        CerverError::Internal("blocking task panicked".to_string())
    } else {
        CerverError::Internal("blocking task cancelled".to_string())
    }
}
