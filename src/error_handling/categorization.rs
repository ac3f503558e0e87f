//! Outcome categorization.
//!
//! Maps reqwest errors and HTTP status codes onto the executor's retry
//! policy, and provides the fixed-interval retry strategy used by the login
//! loop.

use std::time::Duration;

use reqwest::StatusCode;
use tokio_retry::strategy::FixedInterval;

use super::types::ErrorType;

/// How the executor reacts to a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx: hand the response to the caller
    Success,
    /// 429: trip the rate-limit coordinator and retry once clear
    RateLimited,
    /// 500/502/503/504: retry immediately
    ServerError,
    /// 400/401/403/404: return as-is, domain logic interprets it
    ClientTerminal,
    /// Anything else: fatal
    Unexpected,
}

/// Classifies a response status.
pub fn classify_status(status: StatusCode) -> StatusClass {
    match status.as_u16() {
        200..=299 => StatusClass::Success,
        429 => StatusClass::RateLimited,
        500 | 502 | 503 | 504 => StatusClass::ServerError,
        400 | 401 | 403 | 404 => StatusClass::ClientTerminal,
        _ => StatusClass::Unexpected,
    }
}

impl StatusClass {
    /// The stats category for this class, if it is not a success.
    pub fn error_type(&self) -> Option<ErrorType> {
        match self {
            StatusClass::Success => None,
            StatusClass::RateLimited => Some(ErrorType::RateLimited),
            StatusClass::ServerError => Some(ErrorType::ServerError),
            StatusClass::ClientTerminal => Some(ErrorType::ClientTerminal),
            StatusClass::Unexpected => Some(ErrorType::UnclassifiedFatal),
        }
    }
}

/// Categorizes a `reqwest::Error` raised while sending or reading a request.
///
/// Builder, redirect and decode errors are configuration or payload problems
/// that retrying cannot fix. Everything else (timeouts, refused or reset
/// connections, proxy failures, a server dropping the connection halfway
/// through the body) is transient.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> ErrorType {
    if error.is_builder() {
        ErrorType::TransportBuilder
    } else if error.is_redirect() {
        ErrorType::TransportRedirect
    } else if error.is_decode() {
        ErrorType::TransportDecode
    } else if error.is_timeout() {
        ErrorType::TransientTimeout
    } else if error.is_connect() {
        ErrorType::TransientConnect
    } else if error.is_body() {
        ErrorType::TransientBody
    } else {
        ErrorType::TransientRequest
    }
}

/// Returns the delays between login attempts.
///
/// Yields `max_attempts - 1` fixed delays: one before each retry.
pub fn get_login_retry_strategy(max_attempts: usize) -> impl Iterator<Item = Duration> {
    FixedInterval::from_millis(crate::config::LOGIN_RETRY_DELAY_MS)
        .take(max_attempts.saturating_sub(1))
}
