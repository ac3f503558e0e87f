//! Fixed-size pool for CPU-adjacent work.
//!
//! Merge, link and sort steps over fetched pages are not I/O bound; they run
//! on tokio's blocking threads, at most `size` at a time, so they never stall
//! the request loop.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error_handling::PaginationError;

#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Creates a pool running at most `size` jobs at once (minimum 1).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs `job` on a blocking thread once a worker slot is free.
    ///
    /// # Errors
    ///
    /// Returns `PaginationError::Worker` if the job panicked.
    pub async fn run<F, T>(&self, job: F) -> Result<T, PaginationError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| PaginationError::Worker(e.to_string()))?;
        tokio::task::spawn_blocking(job)
            .await
            .map_err(|e| PaginationError::Worker(e.to_string()))
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(crate::config::default_parallelism())
    }
}
