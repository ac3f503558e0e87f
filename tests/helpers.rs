// Shared test helpers for sessions backed by an httptest mock server.
//
// Each test file pulls these in with `mod helpers;`.

use std::sync::Arc;
use std::time::Duration;

use httptest::Server;
use signed_pager::config::Config;
use signed_pager::session::{Identity, SessionManager, SessionManagerBuilder};
use signed_pager::signing::{DynamicRuleSet, StaticRuleSetSource};

/// Identity id used by every helper-built session.
#[allow(dead_code)]
pub const TEST_IDENTITY_ID: u64 = 12345;

/// A fixed rule set for signing test requests.
#[allow(dead_code)]
pub fn test_rules() -> DynamicRuleSet {
    DynamicRuleSet {
        static_param: "9pGMwAMvbYZiPNt3pNNxGk6wyGOS7IJq".to_string(),
        format: "20:{}:{:x}:64f1b3ab".to_string(),
        checksum_indexes: vec![1, 5, 9, 14, 22, 31, 38],
        checksum_constant: -1127,
        app_token: Some("33d57ade8c02dbc5a333db99ff9ae26a".to_string()),
        remove_headers: Vec::new(),
    }
}

/// Config pointing at the mock server with short rate-limit intervals.
#[allow(dead_code)]
pub fn test_config(server: &Server) -> Config {
    test_config_for(server.url_str("/"))
}

/// Test config for an arbitrary base URL.
#[allow(dead_code)]
pub fn test_config_for(base_url: String) -> Config {
    Config {
        base_url,
        max_concurrency: 4,
        worker_threads: 2,
        timeout_seconds: 5,
        connect_timeout_seconds: 2,
        probe_path: "/probe".to_string(),
        rate_limit_poll_interval: Duration::from_millis(10),
        rate_limit_backoff_interval: Duration::from_millis(50),
        max_login_attempts: 3,
        ..Default::default()
    }
}

/// Builder for the test identity with the static test rules.
#[allow(dead_code)]
pub fn test_builder(config: Config) -> SessionManagerBuilder {
    SessionManager::builder(config, Identity::new(TEST_IDENTITY_ID, "sess=abc"))
        .rules_source(Arc::new(StaticRuleSetSource(test_rules())))
}

/// Session manager for the test identity against `server`.
#[allow(dead_code)]
pub fn test_manager(server: &Server) -> Arc<SessionManager> {
    Arc::new(
        test_builder(test_config(server))
            .build()
            .expect("Failed to build test session manager"),
    )
}
