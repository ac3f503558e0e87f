//! Ordered proxy pool with explicit rotation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use futures::future::join_all;

use super::endpoint::ProxyEndpoint;
use crate::error_handling::ProxyError;

/// Ordered list of validated proxies plus a current index.
///
/// Rotation is explicit: nothing in the engine rotates automatically on
/// failure. The index is shared by every session using the pool.
#[derive(Default)]
pub struct ProxyPool {
    endpoints: RwLock<Vec<ProxyEndpoint>>,
    index: AtomicUsize,
}

impl ProxyPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool from already-trusted endpoints, skipping validation.
    pub fn from_endpoints(endpoints: Vec<ProxyEndpoint>) -> Self {
        Self {
            endpoints: RwLock::new(endpoints),
            index: AtomicUsize::new(0),
        }
    }

    /// Probes every candidate concurrently and admits the reachable ones.
    ///
    /// A candidate is admitted when a GET to `probe_url` through it completes
    /// with any HTTP response; the response status and content are not
    /// inspected. Unparseable candidates are skipped. Admitted endpoints keep
    /// the candidates' order. Returns the number admitted.
    pub async fn validate(&self, candidates: &[String], probe_url: &str, timeout: Duration) -> usize {
        let probes = candidates.iter().map(|raw| async move {
            let endpoint = match ProxyEndpoint::parse(raw) {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    log::warn!("Skipping proxy candidate: {}", e);
                    return None;
                }
            };
            match probe_endpoint(&endpoint, probe_url, timeout).await {
                Ok(status) => {
                    log::debug!("Proxy {} reachable (probe status {})", endpoint, status);
                    Some(endpoint)
                }
                Err(e) => {
                    log::warn!("Proxy {} failed reachability probe: {}", endpoint, e);
                    None
                }
            }
        });

        let admitted: Vec<ProxyEndpoint> = join_all(probes).await.into_iter().flatten().collect();
        let count = admitted.len();
        log::info!(
            "Validated proxies: {} of {} candidates admitted",
            count,
            candidates.len()
        );

        match self.endpoints.write() {
            Ok(mut endpoints) => endpoints.extend(admitted),
            Err(poisoned) => poisoned.into_inner().extend(admitted),
        }
        count
    }

    /// Endpoint at the current index, if any.
    pub fn current(&self) -> Option<ProxyEndpoint> {
        let endpoints = self.read();
        if endpoints.is_empty() {
            return None;
        }
        let index = self.index.load(Ordering::SeqCst) % endpoints.len();
        endpoints.get(index).cloned()
    }

    /// Round-robin selection: returns the current endpoint and advances.
    pub fn next(&self) -> Option<ProxyEndpoint> {
        let endpoints = self.read();
        if endpoints.is_empty() {
            return None;
        }
        let index = self.index.fetch_add(1, Ordering::SeqCst) % endpoints.len();
        endpoints.get(index).cloned()
    }

    /// Advances the current index (modulo length) and returns the new
    /// current endpoint.
    pub fn rotate(&self) -> Option<ProxyEndpoint> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        let previous = self
            .index
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % len))
            .unwrap_or(0);
        let endpoint = self.read().get((previous + 1) % len).cloned();
        if let Some(endpoint) = &endpoint {
            log::info!("Rotated to proxy {}", endpoint);
        }
        endpoint
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<ProxyEndpoint>> {
        match self.endpoints.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

async fn probe_endpoint(
    endpoint: &ProxyEndpoint,
    probe_url: &str,
    timeout: Duration,
) -> Result<u16, ProxyError> {
    let client = reqwest::Client::builder()
        .proxy(endpoint.to_reqwest()?)
        .timeout(timeout)
        .build()?;
    let response = client.get(probe_url).send().await?;
    Ok(response.status().as_u16())
}
