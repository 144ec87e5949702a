//! Worker pools for the batch operations
//!
//! Every batch call runs its parallel region inside the [`WorkerPool`] it is
//! handed, never on rayon's global pool, so filters tuned to different
//! worker counts do not affect each other.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{BloomError, Result};

/// A dedicated rayon thread pool with a fixed number of workers
#[derive(Debug)]
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `num_workers` threads.
    ///
    /// `0` lets rayon pick its default (the number of logical CPUs, or
    /// `RAYON_NUM_THREADS` when set).
    pub fn new(num_workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("bloom-worker-{}", i))
            .build()
            .map_err(|e| BloomError::ThreadPool(e.to_string()))?;

        tracing::debug!(workers = pool.current_num_threads(), "built worker pool");
        Ok(WorkerPool { pool })
    }

    /// A pool with exactly one worker
    pub fn single() -> Result<Self> {
        Self::new(1)
    }

    /// Number of worker threads in the pool
    pub fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool and block until it and all the parallel work
    /// it spawned have finished.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}
