//! Outbound proxy handling.
//!
//! This module handles:
//! - Parsing proxy URLs into endpoints (with optional credentials)
//! - Validating candidates with a reachability probe
//! - Round-robin selection and explicit rotation

mod endpoint;
mod pool;

pub use endpoint::{ProxyCredentials, ProxyEndpoint};
pub use pool::ProxyPool;
