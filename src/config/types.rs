//! Configuration types.
//!
//! This module defines the engine configuration struct and the logging
//! option enums. Loading configuration from files or the command line is the
//! embedding application's job; `Config` is constructed programmatically.

use std::time::Duration;

use crate::config::constants::{
    default_parallelism, CONNECT_TIMEOUT_SECS, DEFAULT_USER_AGENT, MAX_LOGIN_ATTEMPTS,
    RATE_LIMIT_BACKOFF_INTERVAL, RATE_LIMIT_POLL_INTERVAL, REQUEST_TIMEOUT_SECS,
};

/// Logging level for the engine.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Engine configuration.
///
/// # Examples
///
/// ```no_run
/// use signed_pager::Config;
///
/// let config = Config {
///     base_url: "https://api.example.com".to_string(),
///     max_concurrency: 8,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the platform API; also sent as the referer
    pub base_url: String,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Maximum in-flight requests per identity (ConcurrencyGate limit)
    pub max_concurrency: usize,

    /// Size of the auxiliary worker pool for merge/transform work
    pub worker_threads: usize,

    /// Per-attempt request timeout in seconds
    pub timeout_seconds: u64,

    /// TCP connect timeout in seconds
    pub connect_timeout_seconds: u64,

    /// Fallback User-Agent for identities without one
    pub user_agent: String,

    /// URL of the remote dynamic rule set (None = rules supplied in-process)
    pub rules_url: Option<String>,

    /// Cheap endpoint the rate-limit prober hits while checking
    pub probe_path: String,

    /// Interval at which blocked requests re-check the rate-limit state
    pub rate_limit_poll_interval: Duration,

    /// Sleep between probes that were themselves rate limited
    pub rate_limit_backoff_interval: Duration,

    /// Maximum login attempts before giving up
    pub max_login_attempts: usize,

    /// Outbound proxy URLs (validated before use)
    pub proxies: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://localhost".to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            max_concurrency: default_parallelism(),
            worker_threads: default_parallelism(),
            timeout_seconds: REQUEST_TIMEOUT_SECS,
            connect_timeout_seconds: CONNECT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rules_url: None,
            probe_path: "/".to_string(),
            rate_limit_poll_interval: RATE_LIMIT_POLL_INTERVAL,
            rate_limit_backoff_interval: RATE_LIMIT_BACKOFF_INTERVAL,
            max_login_attempts: MAX_LOGIN_ATTEMPTS,
            proxies: Vec::new(),
        }
    }
}
