//! Bounded login state machine.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use url::Url;

use super::second_factor::SecondFactorSource;
use crate::config::{
    API_CODE_INVALID_SESSION, API_CODE_SECOND_FACTOR, DEFAULT_LOGIN_PATH,
    DEFAULT_SECOND_FACTOR_PATH, LOGIN_ABANDON_MESSAGES, MAX_SECOND_FACTOR_PROMPTS,
};
use crate::error_handling::{get_login_retry_strategy, ApiError, AuthError, RequestError};
use crate::request::RequestExecutor;
use crate::utils::Clock;

/// Result of a login run. Never an error: a failed login is
/// `authenticated: false` with a null `raw` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    pub authenticated: bool,
    /// Account object returned by the login endpoint (null on failure)
    pub raw: Value,
    /// One readable message per failed step, in order
    pub errors: Vec<String>,
    /// Login requests issued
    pub attempts: usize,
}

impl AuthOutcome {
    fn failed(errors: Vec<String>, attempts: usize) -> Self {
        Self {
            authenticated: false,
            raw: Value::Null,
            errors,
            attempts,
        }
    }
}

/// Maps known platform error codes to readable messages.
pub fn remap_api_error(error: &ApiError) -> String {
    match error.code {
        API_CODE_SECOND_FACTOR => format!("Second factor required: {}", error.reason),
        API_CODE_INVALID_SESSION => format!(
            "Invalid session, the identity's cookie is no longer accepted: {}",
            error.reason
        ),
        _ => error.reason.clone(),
    }
}

fn is_abandon_message(reason: &str) -> bool {
    LOGIN_ABANDON_MESSAGES
        .iter()
        .any(|fragment| reason.contains(fragment))
}

enum Step {
    Retry,
    RetryNow,
    Abandon,
}

/// Login loop for one identity.
///
/// Each attempt fetches the account from the login endpoint. Failed attempts
/// are retried after a fixed delay, up to the configured maximum. A
/// second-factor challenge asks the `SecondFactorSource` for a code, submits
/// it and retries at once. Messages matching `LOGIN_ABANDON_MESSAGES` and a
/// closed session end the loop early.
pub struct Authenticator {
    executor: RequestExecutor,
    clock: Arc<dyn Clock>,
    second_factor: Option<Arc<dyn SecondFactorSource>>,
    max_attempts: usize,
    login_path: String,
    second_factor_path: String,
}

impl Authenticator {
    pub fn new(
        executor: RequestExecutor,
        clock: Arc<dyn Clock>,
        second_factor: Option<Arc<dyn SecondFactorSource>>,
        max_attempts: usize,
    ) -> Self {
        Self {
            executor,
            clock,
            second_factor,
            max_attempts: max_attempts.max(1),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            second_factor_path: DEFAULT_SECOND_FACTOR_PATH.to_string(),
        }
    }

    /// Overrides the login and second-factor endpoint paths.
    pub fn with_paths(
        mut self,
        login_path: impl Into<String>,
        second_factor_path: impl Into<String>,
    ) -> Self {
        self.login_path = login_path.into();
        self.second_factor_path = second_factor_path.into();
        self
    }

    /// Runs the login loop.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUrl` if the endpoint paths do not resolve
    /// against the base URL. Every other failure is reported in the outcome.
    pub async fn login(&self) -> Result<AuthOutcome, AuthError> {
        let login_url = self.executor.url(&self.login_path)?;
        let second_factor_url = self.executor.url(&self.second_factor_path)?;
        let identity_id = self.executor.manager().session().identity().id;

        let mut delays = get_login_retry_strategy(self.max_attempts);
        let mut errors = Vec::new();
        let mut prompts = 0;
        let mut attempts = 0;

        while attempts < self.max_attempts {
            attempts += 1;
            let step = match self
                .executor
                .json_request::<Value>(&login_url, Method::GET, None)
                .await
            {
                Ok(raw) if raw.get("isAuth").and_then(Value::as_bool) != Some(false) => {
                    log::info!(
                        "Identity {} authenticated after {} attempt(s)",
                        identity_id,
                        attempts
                    );
                    return Ok(AuthOutcome {
                        authenticated: true,
                        raw,
                        errors,
                        attempts,
                    });
                }
                Ok(_) => {
                    errors.push("Login endpoint reported the identity as not authenticated".to_string());
                    Step::Retry
                }
                Err(RequestError::Api(api_error)) => {
                    let message = remap_api_error(&api_error);
                    errors.push(message.clone());
                    if is_abandon_message(&api_error.reason) {
                        log::warn!("Abandoning login for identity {}: {}", identity_id, message);
                        Step::Abandon
                    } else if api_error.code == API_CODE_SECOND_FACTOR {
                        self.second_factor(&second_factor_url, &message, &mut prompts, &mut errors)
                            .await
                    } else {
                        Step::Retry
                    }
                }
                Err(e @ (RequestError::SessionClosed | RequestError::GateClosed)) => {
                    errors.push(e.to_string());
                    Step::Abandon
                }
                Err(e) => {
                    errors.push(e.to_string());
                    Step::Retry
                }
            };

            match step {
                Step::Abandon => break,
                Step::RetryNow => continue,
                Step::Retry => {
                    log::debug!(
                        "Login attempt {}/{} for identity {} failed",
                        attempts,
                        self.max_attempts,
                        identity_id
                    );
                    if let Some(delay) = delays.next() {
                        self.clock.sleep(delay).await;
                    }
                }
            }
        }

        log::warn!(
            "Login failed for identity {} after {} attempt(s)",
            identity_id,
            attempts
        );
        Ok(AuthOutcome::failed(errors, attempts))
    }

    async fn second_factor(
        &self,
        url: &Url,
        reason: &str,
        prompts: &mut usize,
        errors: &mut Vec<String>,
    ) -> Step {
        let Some(source) = &self.second_factor else {
            errors.push("No second-factor source configured".to_string());
            return Step::Abandon;
        };
        if *prompts >= MAX_SECOND_FACTOR_PROMPTS {
            errors.push("Too many second-factor prompts".to_string());
            return Step::Abandon;
        }
        *prompts += 1;

        let Some(code) = source.code(reason).await else {
            errors.push("Second-factor prompt cancelled".to_string());
            return Step::Abandon;
        };
        let body = json!({ "code": code });
        match self
            .executor
            .json_request::<Value>(url, Method::POST, Some(&body))
            .await
        {
            Ok(_) => log::info!("Second-factor code accepted"),
            Err(e) => {
                log::warn!("Second-factor code rejected: {}", e);
                errors.push(e.to_string());
            }
        }
        Step::RetryNow
    }
}
