//! Configuration constants.
//!
//! This module defines the defaults used throughout the engine: request
//! timeouts, rate-limit intervals, login attempt limits and pagination sizes.

use std::time::Duration;

/// Default User-Agent string for API requests.
///
/// Identities normally carry their own User-Agent (it is part of the
/// authenticated browser fingerprint); this value is only used when an
/// identity does not provide one.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// Network operation timeouts
/// Per-attempt request timeout in seconds.
/// Transient failures are retried without backoff, so this is the only
/// bound on how long a single attempt may take.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// TCP connection timeout in seconds
pub const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Timeout for a single proxy reachability probe in seconds
pub const PROXY_PROBE_TIMEOUT_SECS: u64 = 10;

// Rate limiting
/// How often a blocked request re-checks the rate-limit state.
pub const RATE_LIMIT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// How long the probe loop sleeps after the probe itself was rate limited.
pub const RATE_LIMIT_BACKOFF_INTERVAL: Duration = Duration::from_secs(30);

// Login
/// Maximum number of login attempts (including the first one)
pub const MAX_LOGIN_ATTEMPTS: usize = 10;
/// Fixed delay between login attempts in milliseconds
pub const LOGIN_RETRY_DELAY_MS: u64 = 1000;
/// Maximum number of second-factor codes requested during one login
pub const MAX_SECOND_FACTOR_PROMPTS: usize = 3;
/// Platform error code meaning a second factor is required
pub const API_CODE_SECOND_FACTOR: i64 = 101;
/// Platform error code meaning the session cookie is no longer valid
pub const API_CODE_INVALID_SESSION: i64 = 401;
/// Error message fragments that end the login loop immediately.
/// Retrying cannot fix these: the identity's credentials must be replaced.
pub const LOGIN_ABANDON_MESSAGES: &[&str] = &[
    "Please refresh the page",
    "User not found",
    "Access Denied",
];

/// Endpoint returning the authenticated account
pub const DEFAULT_LOGIN_PATH: &str = "/api2/v2/users/me";
/// Endpoint accepting a second-factor code
pub const DEFAULT_SECOND_FACTOR_PATH: &str = "/api2/v2/users/otp/check";

// Pagination
/// Default page size for offset and cursor pagination
pub const DEFAULT_PAGE_LIMIT: u64 = 10;
/// Query parameter carrying the cursor (last item id) in cursor pagination
pub const DEFAULT_CURSOR_PARAM: &str = "id";

// HTTP status codes (for clarity and consistency)
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Returns the number of parallel hardware units, falling back to 1.
///
/// Used as the default ConcurrencyGate limit, worker pool size and wave
/// multiplier.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
