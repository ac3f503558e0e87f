//! Bounded admission control for in-flight requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error_handling::RequestError;

/// Caps the number of concurrently admitted callers at `limit`.
///
/// Shared by every executor of one identity. Admission is represented by a
/// `GatePermit`; dropping it releases the slot, so a slot is returned on
/// every exit path, including early returns and panics.
#[derive(Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// One admitted slot. Released on drop.
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyGate {
    /// Creates a gate admitting at most `limit` callers (minimum 1).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Suspends until a slot is free.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::GateClosed` if the gate was closed.
    pub async fn acquire(&self) -> Result<GatePermit, RequestError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| RequestError::GateClosed)?;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Ok(GatePermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Fails every pending and future `acquire`.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Configured limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Currently admitted callers.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously admitted callers observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Free slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(crate::config::default_parallelism())
    }
}
