//! Error type definitions.
//!
//! This module defines every error returned by the engine plus the
//! `ErrorType`/`InfoType` outcome categories counted by `ProcessingStats`.

use std::fmt;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The configured base URL could not be parsed.
    #[error("Invalid base URL: {0}")]
    BaseUrlError(#[from] url::ParseError),

    /// The selected proxy could not be applied to the client.
    #[error("Proxy configuration error: {0}")]
    ProxyError(#[from] ProxyError),

    /// The remote rule source could not be set up.
    #[error("Rule source initialization error: {0}")]
    RuleSourceError(#[from] RuleSetError),

    /// Neither an in-process rule source nor a rules URL was configured.
    #[error("No rule source configured (set Config::rules_url or supply a RuleSetSource)")]
    MissingRuleSourceError,
}

/// Structured `{code, reason}` error returned by the platform.
///
/// Produced for every non-200 JSON response and for 200 responses whose body
/// carries an `{"error": {...}}` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Platform error code, or the HTTP status when the body carried none
    pub code: i64,
    /// Human readable reason
    pub reason: String,
}

impl ApiError {
    pub fn new(code: i64, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error {}: {}", self.code, self.reason)
    }
}

impl std::error::Error for ApiError {}

/// Errors surfaced by the request executor.
///
/// Transient transport failures, 429s and 5xx responses are absorbed by the
/// executor's retry loop and never appear here.
#[derive(Error, Debug)]
pub enum RequestError {
    /// A transport failure that retrying cannot fix (builder, redirect, decode).
    #[error("Transport error: {0}")]
    Transport(#[from] ReqwestError),

    /// Status code outside the handled set; signals unhandled API drift.
    #[error("Unexpected HTTP status {status} for {url}")]
    UnexpectedStatus {
        /// The HTTP status received
        status: u16,
        /// The request URL
        url: String,
    },

    /// Structured platform error (non-200 JSON response or error envelope).
    #[error("{0}")]
    Api(ApiError),

    /// A 200 body that did not decode into the requested type.
    #[error("Response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request headers could not be computed.
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    /// The identity's rule set could not be loaded.
    #[error("Rule set unavailable: {0}")]
    Rules(#[from] RuleSetError),

    /// A composed header name or value was not valid HTTP.
    #[error("Invalid header {0}")]
    InvalidHeader(String),

    /// The owning session was closed while the request was pending.
    #[error("Session closed")]
    SessionClosed,

    /// The concurrency gate was closed while waiting for a slot.
    #[error("Concurrency gate closed")]
    GateClosed,
}

impl RequestError {
    /// Returns the structured API error, if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            RequestError::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors produced while computing a request signature.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SigningError {
    /// A checksum index points past the end of the 40-character digest.
    #[error("Checksum index {index} out of range for digest of length {len}")]
    ChecksumIndexOutOfRange {
        /// Offending index
        index: usize,
        /// Digest length
        len: usize,
    },

    /// The checksum constant pushes the checksum outside the `i64` range.
    #[error("Checksum overflows with constant {constant}")]
    ChecksumOverflow {
        /// The rule set's checksum constant
        constant: i64,
    },

    /// The rule set's format string could not be applied.
    #[error("Invalid signature format {format:?}: {reason}")]
    InvalidFormat {
        /// The format string
        format: String,
        /// What was wrong with it
        reason: String,
    },
}

/// Errors fetching a dynamic rule set.
#[derive(Error, Debug)]
pub enum RuleSetError {
    /// HTTP failure talking to the rule source.
    #[error("Failed to fetch rule set: {0}")]
    Fetch(#[from] ReqwestError),

    /// The rule source answered with a non-success status.
    #[error("Rule source returned HTTP {0}")]
    Status(u16),

    /// The rule document did not match the expected shape.
    #[error("Failed to parse rule set: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors handling proxy endpoints.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The proxy URL could not be parsed.
    #[error("Invalid proxy URL {0:?}: {1}")]
    InvalidUrl(String, url::ParseError),

    /// The proxy URL lacks a host.
    #[error("Proxy URL {0:?} has no host")]
    MissingHost(String),

    /// Scheme not supported by the HTTP client.
    #[error("Unsupported proxy scheme {0:?}")]
    UnsupportedScheme(String),

    /// reqwest rejected the proxy configuration.
    #[error("Proxy client error: {0}")]
    Client(#[from] ReqwestError),
}

/// Errors building page requests.
#[derive(Error, Debug)]
pub enum PaginationError {
    /// A rendered template was not a valid URL.
    #[error("Invalid page URL {url:?}: {source}")]
    InvalidUrl {
        /// The rendered URL text
        url: String,
        /// Parse failure
        source: url::ParseError,
    },

    /// Wave pagination needs a non-zero limit and multiplier.
    #[error("Invalid wave parameters: limit={limit}, multiplier={multiplier}")]
    InvalidWave {
        /// Page size
        limit: u64,
        /// Pages per wave
        multiplier: usize,
    },

    /// A worker-pool task panicked or was cancelled.
    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Errors that prevent the login state machine from starting.
///
/// Failed attempts are not errors: they end up in `AuthOutcome::errors`.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The login endpoint URL could not be built.
    #[error("Invalid login URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Categories of request outcomes counted by `ProcessingStats`.
///
/// Transient categories are retried by the executor; the rest are terminal
/// or fatal from the transport's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    // Transient transport failures (retried immediately, unbounded)
    TransientTimeout,
    TransientConnect,
    TransientRequest,
    TransientBody,
    // Non-retriable transport failures
    TransportBuilder,
    TransportRedirect,
    TransportDecode,
    // Status classes
    RateLimited,      // 429
    ServerError,      // 500/502/503/504
    ClientTerminal,   // 400/401/403/404
    UnclassifiedFatal, // Anything else
    // Session lifecycle
    SessionClosed,
}

/// Informational outcomes that are not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    RequestSucceeded,
    RateLimitCleared,
    ProxyRotated,
    PageFailedDegraded,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::TransientTimeout => "Transient timeout",
            ErrorType::TransientConnect => "Transient connect error",
            ErrorType::TransientRequest => "Transient request error",
            ErrorType::TransientBody => "Transient body error",
            ErrorType::TransportBuilder => "Request builder error",
            ErrorType::TransportRedirect => "Redirect error",
            ErrorType::TransportDecode => "Decode error",
            ErrorType::RateLimited => "Rate limited (429)",
            ErrorType::ServerError => "Server error (5xx)",
            ErrorType::ClientTerminal => "Client error (4xx)",
            ErrorType::UnclassifiedFatal => "Unexpected status",
            ErrorType::SessionClosed => "Session closed",
        }
    }

    /// Whether the executor retries an outcome of this type.
    pub fn is_retried(&self) -> bool {
        matches!(
            self,
            ErrorType::TransientTimeout
                | ErrorType::TransientConnect
                | ErrorType::TransientRequest
                | ErrorType::TransientBody
                | ErrorType::RateLimited
                | ErrorType::ServerError
        )
    }
}

impl InfoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::RequestSucceeded => "Request succeeded",
            InfoType::RateLimitCleared => "Rate limit cleared",
            InfoType::ProxyRotated => "Proxy rotated",
            InfoType::PageFailedDegraded => "Page fetch failed (treated as empty)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_type_as_str() {
        assert_eq!(ErrorType::RateLimited.as_str(), "Rate limited (429)");
        assert_eq!(ErrorType::ClientTerminal.as_str(), "Client error (4xx)");
        assert_eq!(ErrorType::SessionClosed.to_string(), "Session closed");
    }

    #[test]
    fn test_all_types_have_string_representation() {
        for error_type in ErrorType::iter() {
            assert!(!error_type.as_str().is_empty(), "{:?}", error_type);
        }
        for info_type in InfoType::iter() {
            assert!(!info_type.as_str().is_empty(), "{:?}", info_type);
        }
    }

    #[test]
    fn test_retried_types() {
        assert!(ErrorType::TransientTimeout.is_retried());
        assert!(ErrorType::ServerError.is_retried());
        assert!(ErrorType::RateLimited.is_retried());
        assert!(!ErrorType::ClientTerminal.is_retried());
        assert!(!ErrorType::UnclassifiedFatal.is_retried());
        assert!(!ErrorType::TransportBuilder.is_retried());
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::new(101, "Blocked by 2FA.");
        assert_eq!(err.to_string(), "API error 101: Blocked by 2FA.");
        let req = RequestError::Api(err.clone());
        assert_eq!(req.api_error(), Some(&err));
        assert!(RequestError::SessionClosed.api_error().is_none());
    }
}
