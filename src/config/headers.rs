//! HTTP header name constants.
//!
//! Lowercase names of every header the executor composes for a signed
//! request. Names listed in a rule set's `remove_headers` are matched against
//! these after composition.

/// Request signature produced by the signer
pub const HEADER_SIGN: &str = "sign";
/// Millisecond timestamp the signature was computed for
pub const HEADER_TIME: &str = "time";
/// Platform application token (from the rule set)
pub const HEADER_APP_TOKEN: &str = "app-token";
/// Identity id, sent in plain text alongside the signature
pub const HEADER_USER_ID: &str = "user-id";
/// Client fingerprint token bound to the identity
pub const HEADER_X_BC: &str = "x-bc";
/// Bearer/authorization token for platforms that use one
pub const HEADER_AUTHORIZATION: &str = "authorization";
/// Accept header value sent with every request
pub const ACCEPT_JSON: &str = "application/json, text/plain, */*";
