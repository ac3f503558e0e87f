//! Request execution.
//!
//! This module handles:
//! - Composing signed headers for each attempt
//! - Executing requests through the gate, the rate-limit coordinator and the
//!   session client, with transient/terminal classification
//! - Decoding JSON bodies and the platform's error envelope

mod executor;
mod headers;
mod response;

pub use executor::RequestExecutor;
pub use headers::compose_headers;
pub use response::{ApiResponse, ErrorBody, ErrorEnvelope};
