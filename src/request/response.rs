//! Buffered responses and the platform error envelope.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error_handling::{ApiError, RequestError};

/// A fully read HTTP response.
///
/// The executor buffers the body before releasing its gate slot, so a
/// response never pins a connection after `execute` returns.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The structured error carried by this response, if any.
    ///
    /// A body of the form `{"error": {"code": .., "message": ..}}` always
    /// yields an error, whatever the status. Any other non-200 status yields
    /// an error whose code is the status and whose reason is the body's top-level
    /// message or the status reason phrase.
    pub fn api_error(&self) -> Option<ApiError> {
        let body = serde_json::from_slice::<serde_json::Value>(&self.body).ok();
        let envelope = body
            .as_ref()
            .filter(|body| body.get("error").is_some_and(serde_json::Value::is_object))
            .and_then(|body| ErrorEnvelope::deserialize(body).ok());
        if let Some(envelope) = envelope {
            return Some(envelope.error.into_api_error(self.status));
        }
        if self.status == StatusCode::OK {
            return None;
        }
        let reason = body
            .as_ref()
            .and_then(|body| body.get("message"))
            .and_then(serde_json::Value::as_str)
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("Unknown status")
            .to_string();
        Some(ApiError::new(i64::from(self.status.as_u16()), reason))
    }
}

/// `{"error": {...}}` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Inner error object. Both fields are optional on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Converts to `ApiError`, falling back to the HTTP status for missing
    /// fields.
    pub fn into_api_error(self, status: StatusCode) -> ApiError {
        let code = self.code.unwrap_or_else(|| i64::from(status.as_u16()));
        let reason = self.message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
        ApiError::new(code, reason)
    }
}
