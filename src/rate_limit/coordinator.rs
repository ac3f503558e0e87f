//! Rate-limit coordinator implementation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::probe::{ProbeOutcome, RateLimitProbe};
use crate::error_handling::{InfoType, ProcessingStats};
use crate::utils::Clock;

/// Shared rate-limit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitState {
    /// Requests may be issued
    Clear,
    /// A 429 was observed; all requests wait while the prober runs
    Checking,
}

/// Session-wide rate-limit gate with a single-flight background prober.
///
/// Any executor that sees a 429 calls `report_rate_limited`. The first
/// report flips the state to `Checking` and starts one probe loop; later
/// reports while checking are no-ops. Every executor sharing the coordinator
/// waits in `wait_until_clear` until the probe loop succeeds.
pub struct RateLimitCoordinator {
    state: Mutex<RateLimitState>,
    probe: Arc<dyn RateLimitProbe>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    backoff_interval: Duration,
    shutdown: CancellationToken,
    stats: Option<Arc<ProcessingStats>>,
}

impl RateLimitCoordinator {
    /// Creates a coordinator in the `Clear` state.
    ///
    /// # Arguments
    ///
    /// * `probe` - Cheap request used to detect when the limit has lifted
    /// * `clock` - Time source for polling and backoff sleeps
    /// * `poll_interval` - How often blocked requests re-check the state
    /// * `backoff_interval` - Sleep after a probe that was itself rate limited
    pub fn new(
        probe: Arc<dyn RateLimitProbe>,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
        backoff_interval: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(RateLimitState::Clear),
            probe,
            clock,
            poll_interval,
            backoff_interval,
            shutdown: CancellationToken::new(),
            stats: None,
        }
    }

    /// Attaches the stats tracker used to count cleared rate limits.
    pub fn with_stats(mut self, stats: Arc<ProcessingStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Current state.
    pub fn state(&self) -> RateLimitState {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_state(&self, new_state: RateLimitState) {
        match self.state.lock() {
            Ok(mut guard) => *guard = new_state,
            Err(poisoned) => *poisoned.into_inner() = new_state,
        }
    }

    /// Moves `Clear` to `Checking`. Returns `true` only for the caller that
    /// performed the transition.
    pub fn begin_checking(&self) -> bool {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *guard == RateLimitState::Clear {
            *guard = RateLimitState::Checking;
            true
        } else {
            false
        }
    }

    /// Records a 429 and starts the background prober if none is running.
    pub fn report_rate_limited(self: &Arc<Self>) {
        if self.begin_checking() {
            log::warn!("Rate limited; pausing all requests until the limit lifts");
            let coordinator = Arc::clone(self);
            tokio::spawn(async move {
                let backoffs = coordinator.run_probe_loop().await;
                log::debug!("Rate-limit probe loop finished after {} backoff(s)", backoffs);
            });
        }
    }

    /// Probes until the limit lifts, then clears the state.
    ///
    /// Returns the number of backoff sleeps taken. Exits early (clearing the
    /// state so waiters can observe the shutdown) when `shutdown` is called.
    pub async fn run_probe_loop(&self) -> usize {
        let mut backoffs = 0usize;
        loop {
            if self.shutdown.is_cancelled() {
                self.set_state(RateLimitState::Clear);
                return backoffs;
            }

            match self.probe.probe().await {
                Ok(ProbeOutcome::Clear) => {
                    self.set_state(RateLimitState::Clear);
                    if let Some(stats) = &self.stats {
                        stats.increment_info(InfoType::RateLimitCleared);
                    }
                    log::info!("Rate limit lifted after {} backoff(s)", backoffs);
                    return backoffs;
                }
                Ok(ProbeOutcome::RateLimited) => {
                    log::debug!(
                        "Rate-limit probe still limited; sleeping {}s",
                        self.backoff_interval.as_secs()
                    );
                }
                Err(e) => {
                    log::warn!("Rate-limit probe failed: {}; retrying after backoff", e);
                }
            }

            backoffs += 1;
            tokio::select! {
                _ = self.clock.sleep(self.backoff_interval) => {}
                _ = self.shutdown.cancelled() => {}
            }
        }
    }

    /// Suspends until the state is `Clear`, polling every `poll_interval`.
    pub async fn wait_until_clear(&self) {
        while self.state() == RateLimitState::Checking {
            if self.shutdown.is_cancelled() {
                return;
            }
            self.clock.sleep(self.poll_interval).await;
        }
    }

    /// Stops the prober and releases every waiter.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.set_state(RateLimitState::Clear);
    }

    /// Poll interval used by `wait_until_clear`.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
