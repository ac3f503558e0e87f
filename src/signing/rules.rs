//! Dynamic rule set model and sources.
//!
//! The rule set is opaque external configuration published by a remote
//! collaborator. It is fetched once per identity and only replaced by an
//! explicit refresh.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error_handling::RuleSetError;

/// Signing parameters for one platform.
///
/// Field names follow the published rule document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicRuleSet {
    /// Secret prefix line of the signed message
    pub static_param: String,
    /// Output format; field 0 is the hex digest, field 1 the checksum
    pub format: String,
    /// Positions in the hex digest whose ASCII values feed the checksum
    pub checksum_indexes: Vec<usize>,
    /// Constant added to the checksum sum
    pub checksum_constant: i64,
    /// Application token sent as the `app-token` header
    #[serde(default)]
    pub app_token: Option<String>,
    /// Header names to strip after composition
    #[serde(default)]
    pub remove_headers: Vec<String>,
}

/// Remote collaborator that publishes the rule set.
#[async_trait]
pub trait RuleSetSource: Send + Sync {
    /// Fetches the current rule set.
    async fn fetch(&self) -> Result<DynamicRuleSet, RuleSetError>;
}

/// Fetches the rule set as JSON over HTTP.
pub struct HttpRuleSetSource {
    url: String,
    client: reqwest::Client,
}

impl HttpRuleSetSource {
    /// Creates a source for `url` with a 60 second timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, RuleSetError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl RuleSetSource for HttpRuleSetSource {
    async fn fetch(&self) -> Result<DynamicRuleSet, RuleSetError> {
        log::debug!("Fetching dynamic rule set from {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(RuleSetError::Status(response.status().as_u16()));
        }
        let text = response.text().await?;
        let rules: DynamicRuleSet = serde_json::from_str(&text)?;
        log::info!(
            "Loaded dynamic rule set ({} checksum indexes, {} header removals)",
            rules.checksum_indexes.len(),
            rules.remove_headers.len()
        );
        Ok(rules)
    }
}

/// In-process rule source, for rules supplied by the embedding application.
pub struct StaticRuleSetSource(pub DynamicRuleSet);

#[async_trait]
impl RuleSetSource for StaticRuleSetSource {
    async fn fetch(&self) -> Result<DynamicRuleSet, RuleSetError> {
        Ok(self.0.clone())
    }
}
