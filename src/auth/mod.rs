//! Identity login.
//!
//! This module handles:
//! - The bounded login retry loop with fixed delays
//! - Remapping known platform error codes to readable messages
//! - Second-factor prompts through an injectable code source
//! - Early abandonment on errors that retrying cannot fix

mod login;
mod second_factor;

pub use login::{remap_api_error, AuthOutcome, Authenticator};
pub use second_factor::{ScriptedSecondFactor, SecondFactorSource};
