//! Identity sessions.
//!
//! This module handles:
//! - The authenticated identity (cookie, fingerprint headers)
//! - The per-identity HTTP client context with its private cookie jar
//! - `SessionManager`, which owns the state every executor of one identity
//!   shares and hands out executors, pagination engines and authenticators

mod context;
mod identity;
mod manager;

pub use context::Session;
pub use identity::Identity;
pub use manager::{SessionManager, SessionManagerBuilder};
