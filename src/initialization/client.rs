//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::ClientBuilder;

use crate::config::Config;
use crate::error_handling::InitializationError;
use crate::proxy::ProxyEndpoint;

/// Initializes the HTTP client used by one session.
///
/// Creates a `reqwest::Client` configured with:
/// - Request and connect timeouts from the config
/// - User-Agent header from the config
/// - The session's cookie jar, so cookies persist across requests
/// - An optional proxy routing all traffic (with basic auth if present)
///
/// # Errors
///
/// Returns `InitializationError::ProxyError` if the proxy cannot be applied,
/// or `InitializationError::HttpClientError` if client creation fails.
pub fn init_client(
    config: &Config,
    proxy: Option<&ProxyEndpoint>,
    jar: Arc<Jar>,
) -> Result<Arc<reqwest::Client>, InitializationError> {
    let mut builder = ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .user_agent(config.user_agent.clone())
        .cookie_provider(jar);

    if let Some(endpoint) = proxy {
        log::debug!("Routing session traffic through proxy {}", endpoint);
        builder = builder.proxy(endpoint.to_reqwest()?);
    }

    Ok(Arc::new(builder.build()?))
}
