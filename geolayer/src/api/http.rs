//! API client abstraction for testability.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use super::types::{ApiError, ApiResponse, Credential};

/// Default base URL of the geometry API.
pub const DEFAULT_API_URL: &str = "https://api.ellipsis-drive.com/v1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Authenticated access to the remote API.
///
/// This abstraction allows the loader to be driven by a scripted client in
/// tests and by [`ReqwestApiClient`] in production.
pub trait ApiClient: Send + Sync {
    /// Performs a POST with a JSON body.
    ///
    /// # Arguments
    ///
    /// * `path` - Endpoint path relative to the base URL, e.g. `/geometry/tile`
    /// * `body` - JSON request body
    /// * `credential` - Optional bearer credential
    ///
    /// # Returns
    ///
    /// The decoded response body, or an [`ApiError`] on transport failure or
    /// non-success status. HTTP 429 is reported as [`ApiError::RateLimited`].
    fn post(
        &self,
        path: &str,
        body: &Value,
        credential: Option<&Credential>,
    ) -> impl Future<Output = Result<ApiResponse, ApiError>> + Send;
}

/// Real API client using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestApiClient {
    /// Creates a client for the default API URL and timeout.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_options(DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom base URL and timeout.
    pub fn with_options(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(
        &self,
        path: &str,
        body: &Value,
        credential: Option<&Credential>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.endpoint(path);
        let payload = serde_json::to_vec(body).map_err(|e| ApiError::Decode(e.to_string()))?;

        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);

        if let Some(credential) = credential {
            request = request.header(AUTHORIZATION, format!("Bearer {}", credential.token));
            if let Some(map_id) = &credential.map_id {
                request = request.query(&[("mapId", map_id)]);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to read response: {}", e)))?;

        debug!(
            path,
            status = status.as_u16(),
            bytes = bytes.len(),
            "API response received"
        );

        let decoded = decode_body(content_type.as_deref(), bytes);

        if status.is_success() {
            return decoded;
        }

        let message = match decoded {
            Ok(ApiResponse::Json(value)) => error_message(&value),
            Ok(ApiResponse::Text(text)) => text,
            _ => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        Err(ApiError::from_status(status.as_u16(), message))
    }
}

impl ApiClient for ReqwestApiClient {
    fn post(
        &self,
        path: &str,
        body: &Value,
        credential: Option<&Credential>,
    ) -> impl Future<Output = Result<ApiResponse, ApiError>> + Send {
        self.execute(path, body, credential)
    }
}

/// Decode a body by content type: JSON, text, or raw bytes.
///
/// A missing content type is treated as text.
fn decode_body(content_type: Option<&str>, bytes: bytes::Bytes) -> Result<ApiResponse, ApiError> {
    let (is_json, is_text) = match content_type {
        Some(ct) => (ct.contains("application/json"), ct.contains("text")),
        None => (false, true),
    };

    if is_json {
        serde_json::from_slice(&bytes)
            .map(ApiResponse::Json)
            .map_err(|e| ApiError::Decode(e.to_string()))
    } else if is_text {
        Ok(ApiResponse::Text(String::from_utf8_lossy(&bytes).into_owned()))
    } else {
        Ok(ApiResponse::Binary(bytes))
    }
}

fn error_message(value: &Value) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| value.to_string())
}
