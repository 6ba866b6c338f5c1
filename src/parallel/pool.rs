//! Worker threads for leaderboard runs.
//!
//! Each board entry is an independent calculation, so the board fans entries
//! out over rayon. `PITCHSIM_WORKERS` pins the thread count; 0 shares the
//! global pool.

use rayon::ThreadPoolBuilder;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    /// Threads for one board run; 0 means the global rayon pool.
    pub workers: usize,
}

impl WorkerPool {
    pub fn default_workers() -> Self {
        Self::default()
    }

    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }

    /// Run `f` (typically a `par_iter` over board entries) on a pool sized to
    /// `workers`. A pool that fails to build degrades to the global one.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|index| format!("pitchsim-board-{index}"))
            .build()
        {
            Ok(pool) => pool.install(f),
            Err(err) => {
                warn!(workers = self.workers, %err, "failed to build leaderboard pool; using global pool");
                f()
            }
        }
    }
}
