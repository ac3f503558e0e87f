//! Shared utilities.
//!
//! This module provides:
//! - The injectable `Clock` used for sleeping and timestamps

mod clock;

pub use clock::{Clock, RecordingClock, SystemClock};
