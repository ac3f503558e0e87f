//! Rate-limit probes.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use crate::config::HTTP_STATUS_TOO_MANY_REQUESTS;
use crate::session::Session;

/// Result of one probe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The platform answered with something other than 429
    Clear,
    /// The probe itself was rate limited
    RateLimited,
}

/// Cheap request used to detect when a rate limit has lifted.
#[async_trait]
pub trait RateLimitProbe: Send + Sync {
    async fn probe(&self) -> Result<ProbeOutcome>;
}

/// Probes a URL through the session's HTTP client.
///
/// Only a 429 keeps the coordinator checking; any other status means the
/// platform is answering again.
pub struct HttpProbe {
    session: Arc<Session>,
    url: Url,
}

impl HttpProbe {
    pub fn new(session: Arc<Session>, url: Url) -> Self {
        Self { session, url }
    }
}

#[async_trait]
impl RateLimitProbe for HttpProbe {
    async fn probe(&self) -> Result<ProbeOutcome> {
        let client = self.session.client();
        let response = client.get(self.url.clone()).send().await?;
        if response.status().as_u16() == HTTP_STATUS_TOO_MANY_REQUESTS {
            Ok(ProbeOutcome::RateLimited)
        } else {
            Ok(ProbeOutcome::Clear)
        }
    }
}
