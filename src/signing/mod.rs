//! Request signing.
//!
//! This module handles:
//! - The dynamic rule set model and its remote sources
//! - Computing the `sign`/`time` headers for each request
//!
//! Persistent 401 responses to correctly signed requests usually mean the
//! platform rotated its rules; refresh them through
//! `SessionManager::refresh_rules`.

mod rules;
mod signer;

pub use rules::{DynamicRuleSet, HttpRuleSetSource, RuleSetSource, StaticRuleSetSource};
pub use signer::{path_and_query, sign, SignedHeaders};
