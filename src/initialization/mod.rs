//! Shared resource setup.
//!
//! This module provides functions to initialize:
//! - The logger (plain or JSON lines)
//! - Per-session HTTP clients (timeouts, cookie jar, optional proxy)
//!
//! All initialization functions return `InitializationError` on failure.

mod client;
mod logger;

pub use client::init_client;
pub use logger::init_logger_with;
