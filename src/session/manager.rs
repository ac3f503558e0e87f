//! Per-identity owner of shared request state.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::context::Session;
use super::identity::Identity;
use crate::auth::{Authenticator, SecondFactorSource};
use crate::concurrency::{ConcurrencyGate, WorkerPool};
use crate::config::Config;
use crate::error_handling::{InfoType, InitializationError, ProcessingStats, RuleSetError};
use crate::pagination::PaginationEngine;
use crate::proxy::{ProxyEndpoint, ProxyPool};
use crate::rate_limit::{HttpProbe, RateLimitCoordinator, RateLimitProbe};
use crate::request::RequestExecutor;
use crate::signing::{DynamicRuleSet, HttpRuleSetSource, RuleSetSource};
use crate::utils::{Clock, SystemClock};

/// Owns everything executors of one identity share.
///
/// One manager per identity: its session (client, cookie jar, proxy), the
/// rate-limit coordinator, the concurrency gate, the worker pool, the cached
/// rule set and the outcome counters. Executors, pagination engines and the
/// authenticator are cheap handles created from an `Arc<SessionManager>`.
pub struct SessionManager {
    session: Arc<Session>,
    coordinator: Arc<RateLimitCoordinator>,
    gate: ConcurrencyGate,
    workers: WorkerPool,
    stats: Arc<ProcessingStats>,
    clock: Arc<dyn Clock>,
    rules_source: Arc<dyn RuleSetSource>,
    rules: RwLock<Option<Arc<DynamicRuleSet>>>,
    max_login_attempts: usize,
}

/// Builder for `SessionManager`.
///
/// Only the config and identity are required. Everything else defaults to
/// the production implementation: the system clock, an HTTP probe against
/// `Config::probe_path`, and an HTTP rule source at `Config::rules_url`.
pub struct SessionManagerBuilder {
    config: Config,
    identity: Identity,
    rules_source: Option<Arc<dyn RuleSetSource>>,
    clock: Option<Arc<dyn Clock>>,
    probe: Option<Arc<dyn RateLimitProbe>>,
    proxies: Option<Arc<ProxyPool>>,
    stats: Option<Arc<ProcessingStats>>,
}

impl SessionManagerBuilder {
    pub fn rules_source(mut self, source: Arc<dyn RuleSetSource>) -> Self {
        self.rules_source = Some(source);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn RateLimitProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Shares a proxy pool (and its rotation index) with this identity.
    pub fn proxies(mut self, pool: Arc<ProxyPool>) -> Self {
        self.proxies = Some(pool);
        self
    }

    pub fn stats(mut self, stats: Arc<ProcessingStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Opens the session and assembles the manager.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError` if the session cannot be opened, the
    /// probe URL is invalid, or no rule source is available.
    pub fn build(self) -> Result<SessionManager, InitializationError> {
        let rules_source: Arc<dyn RuleSetSource> = match (self.rules_source, &self.config.rules_url)
        {
            (Some(source), _) => source,
            (None, Some(url)) => Arc::new(HttpRuleSetSource::new(url.clone())?),
            (None, None) => return Err(InitializationError::MissingRuleSourceError),
        };

        let session = Arc::new(Session::open(self.identity, &self.config, self.proxies)?);
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let stats = self.stats.unwrap_or_default();
        let probe: Arc<dyn RateLimitProbe> = match self.probe {
            Some(probe) => probe,
            None => {
                let url = session.base_url().join(&self.config.probe_path)?;
                Arc::new(HttpProbe::new(Arc::clone(&session), url))
            }
        };

        let coordinator = RateLimitCoordinator::new(
            probe,
            Arc::clone(&clock),
            self.config.rate_limit_poll_interval,
            self.config.rate_limit_backoff_interval,
        )
        .with_stats(Arc::clone(&stats));

        Ok(SessionManager {
            session,
            coordinator: Arc::new(coordinator),
            gate: ConcurrencyGate::new(self.config.max_concurrency),
            workers: WorkerPool::new(self.config.worker_threads),
            stats,
            clock,
            rules_source,
            rules: RwLock::new(None),
            max_login_attempts: self.config.max_login_attempts,
        })
    }
}

impl SessionManager {
    pub fn builder(config: Config, identity: Identity) -> SessionManagerBuilder {
        SessionManagerBuilder {
            config,
            identity,
            rules_source: None,
            clock: None,
            probe: None,
            proxies: None,
            stats: None,
        }
    }

    /// Returns the cached rule set, fetching it on first use.
    ///
    /// Concurrent first callers share one fetch.
    ///
    /// # Errors
    ///
    /// Returns `RuleSetError` if the first fetch fails; the next call
    /// retries it.
    pub async fn rules(&self) -> Result<Arc<DynamicRuleSet>, RuleSetError> {
        if let Some(rules) = self.rules.read().await.as_ref() {
            return Ok(Arc::clone(rules));
        }
        let mut cached = self.rules.write().await;
        if let Some(rules) = cached.as_ref() {
            return Ok(Arc::clone(rules));
        }
        let rules = Arc::new(self.rules_source.fetch().await?);
        *cached = Some(Arc::clone(&rules));
        Ok(rules)
    }

    /// Refetches the rule set and swaps it in.
    ///
    /// Requests already holding the previous rules finish with them.
    pub async fn refresh_rules(&self) -> Result<Arc<DynamicRuleSet>, RuleSetError> {
        let rules = Arc::new(self.rules_source.fetch().await?);
        *self.rules.write().await = Some(Arc::clone(&rules));
        log::info!("Refreshed rule set for identity {}", self.session.identity().id);
        Ok(rules)
    }

    pub fn executor(self: &Arc<Self>) -> RequestExecutor {
        RequestExecutor::new(Arc::clone(self))
    }

    pub fn pagination(self: &Arc<Self>) -> PaginationEngine {
        PaginationEngine::new(self.executor(), self.workers.clone())
    }

    /// Login loop for this identity, prompting `second_factor` when the
    /// platform asks for a code.
    pub fn authenticator(
        self: &Arc<Self>,
        second_factor: Option<Arc<dyn SecondFactorSource>>,
    ) -> Authenticator {
        Authenticator::new(
            self.executor(),
            Arc::clone(&self.clock),
            second_factor,
            self.max_login_attempts,
        )
    }

    /// Moves the session to the next proxy of the shared pool.
    ///
    /// Returns `None` when the identity connects directly.
    pub fn rotate_proxy(&self) -> Result<Option<ProxyEndpoint>, InitializationError> {
        let rotated = self.session.rotate_proxy()?;
        if rotated.is_some() {
            self.stats.increment_info(InfoType::ProxyRotated);
        }
        Ok(rotated)
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn coordinator(&self) -> &Arc<RateLimitCoordinator> {
        &self.coordinator
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn workers(&self) -> &WorkerPool {
        &self.workers
    }

    pub fn stats(&self) -> &Arc<ProcessingStats> {
        &self.stats
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Closes the session, stops the prober and fails pending gate waits.
    ///
    /// Retry loops still running observe the closed session on their next
    /// attempt and return `RequestError::SessionClosed`.
    pub fn close(&self) {
        self.session.close();
        self.coordinator.shutdown();
        self.gate.close();
        log::info!("Closed session for identity {}", self.session.identity().id);
        self.stats.log_summary();
    }
}
