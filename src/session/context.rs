//! One identity's HTTP client context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use reqwest::cookie::Jar;
use url::Url;

use super::identity::Identity;
use crate::config::Config;
use crate::error_handling::InitializationError;
use crate::initialization::init_client;
use crate::proxy::{ProxyEndpoint, ProxyPool};

/// Open HTTP client context owned by exactly one identity.
///
/// Holds the connection pool, the identity's private cookie jar and the
/// proxy it currently routes through. Closing the session makes every
/// pending retry loop fail with `RequestError::SessionClosed`.
pub struct Session {
    identity: Identity,
    base_url: Url,
    config: Config,
    jar: Arc<Jar>,
    client: RwLock<Arc<reqwest::Client>>,
    proxies: Option<Arc<ProxyPool>>,
    proxy: RwLock<Option<ProxyEndpoint>>,
    closed: AtomicBool,
}

impl Session {
    /// Opens a session for `identity`.
    ///
    /// Seeds the cookie jar with the identity's cookies for the base URL and
    /// builds the client through the pool's current proxy, if a pool is
    /// given and non-empty.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError` if the base URL is invalid or the
    /// client cannot be built.
    pub fn open(
        identity: Identity,
        config: &Config,
        proxies: Option<Arc<ProxyPool>>,
    ) -> Result<Self, InitializationError> {
        let base_url = Url::parse(&config.base_url)?;

        let mut config = config.clone();
        if let Some(user_agent) = &identity.user_agent {
            config.user_agent = user_agent.clone();
        }

        let jar = Arc::new(Jar::default());
        for pair in identity.cookie_pairs() {
            jar.add_cookie_str(&format!("{}; Path=/", pair), &base_url);
        }

        let proxy = proxies.as_ref().and_then(|pool| pool.current());
        let client = init_client(&config, proxy.as_ref(), Arc::clone(&jar))?;
        log::debug!(
            "Opened session for identity {} ({})",
            identity.id,
            proxy
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "direct".to_string())
        );

        Ok(Self {
            identity,
            base_url,
            config,
            jar,
            client: RwLock::new(client),
            proxies,
            proxy: RwLock::new(proxy),
            closed: AtomicBool::new(false),
        })
    }

    /// Current HTTP client. Cheap to call; callers hold it for one attempt.
    pub fn client(&self) -> Arc<reqwest::Client> {
        match self.client.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    /// Proxy the current client routes through.
    pub fn proxy(&self) -> Option<ProxyEndpoint> {
        match self.proxy.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Rotates the shared proxy pool and rebuilds the client through the new
    /// current proxy. Cookies survive the rebuild.
    ///
    /// Returns the new proxy, or `None` if the session has no pool.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError` if the new client cannot be built; the
    /// previous client stays in place.
    pub fn rotate_proxy(&self) -> Result<Option<ProxyEndpoint>, InitializationError> {
        let Some(pool) = &self.proxies else {
            return Ok(None);
        };
        let Some(next) = pool.rotate() else {
            return Ok(None);
        };
        let client = init_client(&self.config, Some(&next), Arc::clone(&self.jar))?;

        match self.client.write() {
            Ok(mut guard) => *guard = client,
            Err(poisoned) => *poisoned.into_inner() = client,
        }
        match self.proxy.write() {
            Ok(mut guard) => *guard = Some(next.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(next.clone()),
        }
        log::info!("Identity {} now routes through {}", self.identity.id, next);
        Ok(Some(next))
    }

    /// Marks the session closed. Idempotent.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            log::info!("Closed session for identity {}", self.identity.id);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
