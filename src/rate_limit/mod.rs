//! Session-wide rate-limit backoff.
//!
//! This module implements a tri-state gate shared by every executor of one
//! session manager:
//! - A 429 anywhere flips the state from clear to checking
//! - While checking, one background loop probes a cheap endpoint
//! - A probe that is itself rate limited sleeps a fixed interval and retries
//! - A successful probe clears the state; blocked requests resume on their
//!   next poll
//!
//! One prober instead of per-request backoff keeps a rate-limited platform
//! from seeing a burst of simultaneous re-checks.

mod coordinator;
mod probe;

pub use coordinator::{RateLimitCoordinator, RateLimitState};
pub use probe::{HttpProbe, ProbeOutcome, RateLimitProbe};
