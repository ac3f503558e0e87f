//! Error handling and request outcome statistics.
//!
//! This module provides:
//! - Error type definitions for every engine component
//! - Status and transport error categorization (retry policy)
//! - Outcome statistics tracking
//! - The login retry strategy

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{
    categorize_reqwest_error, classify_status, get_login_retry_strategy, StatusClass,
};
pub use stats::ProcessingStats;
pub use types::{
    ApiError, AuthError, ErrorType, InfoType, InitializationError, PaginationError, ProxyError,
    RequestError, RuleSetError, SigningError,
};
