//! Session manager setup for embedding applications.
//!
//! This module contains `connect`, which validates the configured proxies
//! and assembles the per-identity `SessionManager`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::config::{Config, PROXY_PROBE_TIMEOUT_SECS};
use crate::proxy::ProxyPool;
use crate::session::{Identity, SessionManager};

/// Opens a session manager for `identity` from `config`.
///
/// Validates `Config::proxies` first when any are configured; the rule
/// set is loaded from `Config::rules_url` on first request.
///
/// # Errors
///
/// Fails if proxies are configured but none is reachable, or if the
/// session cannot be initialized.
pub async fn connect(config: Config, identity: Identity) -> Result<Arc<SessionManager>> {
    let mut builder = SessionManager::builder(config.clone(), identity);

    if !config.proxies.is_empty() {
        let pool = ProxyPool::new();
        let admitted = pool
            .validate(
                &config.proxies,
                &config.base_url,
                Duration::from_secs(PROXY_PROBE_TIMEOUT_SECS),
            )
            .await;
        if admitted == 0 {
            bail!(
                "None of the {} configured proxies is reachable",
                config.proxies.len()
            );
        }
        builder = builder.proxies(Arc::new(pool));
    }

    let manager = builder
        .build()
        .context("Failed to initialize session manager")?;
    Ok(Arc::new(manager))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::InitializationError;

    #[tokio::test]
    async fn test_connect_without_rule_source_fails() {
        let config = Config {
            base_url: "https://api.example.com".to_string(),
            ..Default::default()
        };
        let err = connect(config, Identity::new(1, "")).await.err().expect("connect should fail");
        assert!(matches!(
            err.downcast_ref::<InitializationError>(),
            Some(InitializationError::MissingRuleSourceError)
        ));
    }

    #[tokio::test]
    async fn test_connect_direct() {
        let config = Config {
            base_url: "https://api.example.com".to_string(),
            rules_url: Some("https://rules.example.com/rules.json".to_string()),
            ..Default::default()
        };
        let manager = connect(config, Identity::new(7, "sess=x")).await.unwrap();
        assert!(manager.session().proxy().is_none());
        assert_eq!(manager.session().identity().id, 7);
    }
}
