//! Signed request execution with retry classification.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::headers::compose_headers;
use super::response::ApiResponse;
use crate::error_handling::{
    categorize_reqwest_error, classify_status, ErrorType, InfoType, RequestError, StatusClass,
};
use crate::session::SessionManager;

/// Performs signed HTTP calls for one identity.
///
/// Cheap to clone: all state lives in the shared `SessionManager`.
#[derive(Clone)]
pub struct RequestExecutor {
    manager: Arc<SessionManager>,
}

impl RequestExecutor {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Performs one logical request, retrying until it reaches a terminal
    /// outcome.
    ///
    /// Holds a concurrency gate slot for the whole call. Each attempt waits
    /// for the rate-limit coordinator to be clear, re-signs the request and
    /// sends it through the session's current client.
    ///
    /// Outcome handling:
    /// - transient transport failures and 500/502/503/504: retried at once
    /// - 429: trips the coordinator, retried once it clears
    /// - 2xx and 400/401/403/404: returned as `Ok`
    /// - any other status: `RequestError::UnexpectedStatus`
    ///
    /// Retries are unbounded. The only way to stop a stuck request is to
    /// close the session, which ends the loop with `SessionClosed`.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` for fatal statuses, non-transient transport
    /// errors, signing failures, and closed sessions or gates.
    pub async fn execute(
        &self,
        url: &Url,
        method: Method,
        payload: Option<&Value>,
    ) -> Result<ApiResponse, RequestError> {
        let manager = &self.manager;
        let session = manager.session();
        let stats = manager.stats();
        let coordinator = manager.coordinator();

        let _permit = manager.gate().acquire().await?;

        loop {
            if session.is_closed() {
                stats.increment_error(ErrorType::SessionClosed);
                return Err(RequestError::SessionClosed);
            }
            coordinator.wait_until_clear().await;
            if session.is_closed() {
                stats.increment_error(ErrorType::SessionClosed);
                return Err(RequestError::SessionClosed);
            }

            let rules = manager.rules().await?;
            let headers = compose_headers(
                url,
                session.base_url(),
                session.identity(),
                &rules,
                manager.clock().now_millis(),
            )?;

            let mut request = session
                .client()
                .request(method.clone(), url.clone())
                .headers(headers);
            if let Some(body) = payload {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    let error_type = categorize_reqwest_error(&e);
                    stats.increment_error(error_type);
                    if error_type.is_retried() {
                        log::debug!("{} {} failed ({}); retrying: {}", method, url, error_type, e);
                        continue;
                    }
                    log::warn!("{} {} failed: {}", method, url, e);
                    return Err(RequestError::Transport(e));
                }
            };

            let status = response.status();
            let class = classify_status(status);
            if let Some(error_type) = class.error_type() {
                stats.increment_error(error_type);
            }

            match class {
                StatusClass::Success | StatusClass::ClientTerminal => {
                    match ApiResponse::read(response).await {
                        Ok(response) => {
                            if class == StatusClass::Success {
                                stats.increment_info(InfoType::RequestSucceeded);
                            } else {
                                log::debug!("{} {} returned {}", method, url, status);
                            }
                            return Ok(response);
                        }
                        Err(e) => {
                            let error_type = categorize_reqwest_error(&e);
                            stats.increment_error(error_type);
                            if error_type.is_retried() {
                                log::debug!("Body read for {} failed; retrying: {}", url, e);
                                continue;
                            }
                            return Err(RequestError::Transport(e));
                        }
                    }
                }
                StatusClass::RateLimited => {
                    log::debug!("{} {} rate limited", method, url);
                    coordinator.report_rate_limited();
                }
                StatusClass::ServerError => {
                    log::debug!("{} {} returned {}; retrying", method, url, status);
                }
                StatusClass::Unexpected => {
                    log::error!("{} {} returned unexpected status {}", method, url, status);
                    return Err(RequestError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
            }
        }
    }

    /// Performs a request and decodes a 200 JSON body as `T`.
    ///
    /// # Errors
    ///
    /// Any non-200 status, or a body carrying an `{"error": {...}}`
    /// envelope, becomes `RequestError::Api` with the platform's code and
    /// message. A 200 body that does not decode as `T` is
    /// `RequestError::Decode`.
    pub async fn json_request<T: DeserializeOwned>(
        &self,
        url: &Url,
        method: Method,
        payload: Option<&Value>,
    ) -> Result<T, RequestError> {
        let response = self.execute(url, method, payload).await?;
        if let Some(api_error) = response.api_error() {
            log::debug!("{} answered with {}", url, api_error);
            return Err(RequestError::Api(api_error));
        }
        response.json()
    }

    /// Joins `path` onto the session's base URL.
    pub fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.manager.session().base_url().join(path)
    }
}
