//! Injectable time source.
//!
//! Everything that sleeps or stamps time (rate-limit polling and probing,
//! login retries, request signing) goes through `Clock`, so tests can run
//! without real delays and count the sleeps they expect.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

/// Source of wall-clock time and suspension.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current Unix time in milliseconds.
    fn now_millis(&self) -> i64;

    /// Suspends the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `chrono` and `tokio::time`.
///
/// Uses `tokio::time::sleep`, so a paused tokio test runtime auto-advances it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that records every sleep and returns a fixed time.
///
/// Sleeps yield to the scheduler but do not wait, so loops driven by this
/// clock run at full speed.
#[derive(Debug, Default)]
pub struct RecordingClock {
    now: i64,
    sleeps: Mutex<Vec<Duration>>,
    sleep_count: AtomicUsize,
}

impl RecordingClock {
    /// Creates a clock frozen at `now_millis`.
    pub fn at(now_millis: i64) -> Self {
        Self {
            now: now_millis,
            ..Default::default()
        }
    }

    /// Number of sleeps requested so far.
    pub fn sleep_count(&self) -> usize {
        self.sleep_count.load(Ordering::SeqCst)
    }

    /// Durations of every sleep requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    fn now_millis(&self) -> i64 {
        self.now
    }

    async fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        self.sleep_count.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }
}
