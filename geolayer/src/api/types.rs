//! API error, response and credential types.

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

/// HTTP status the service uses for rate limiting.
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Errors returned by an [`ApiClient`](super::ApiClient).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The server rejected the call because of rate limiting (HTTP 429).
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The response decoded but did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ApiError {
    /// Build the error for a failed status, mapping 429 to [`ApiError::RateLimited`].
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == STATUS_TOO_MANY_REQUESTS {
            ApiError::RateLimited { message }
        } else {
            ApiError::Status { status, message }
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }

    /// HTTP status associated with the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::RateLimited { .. } => Some(STATUS_TOO_MANY_REQUESTS),
            _ => None,
        }
    }
}

/// Decoded response body, chosen by the response `Content-Type`.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    Text(String),
    Binary(Bytes),
}

impl ApiResponse {
    /// Take the body as JSON.
    ///
    /// Text bodies are parsed as JSON as a fallback for servers that send the
    /// wrong content type.
    pub fn into_json(self) -> Result<Value, ApiError> {
        match self {
            ApiResponse::Json(value) => Ok(value),
            ApiResponse::Text(text) => {
                serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
            }
            ApiResponse::Binary(bytes) => Err(ApiError::UnexpectedResponse(format!(
                "expected JSON, got {} bytes of binary data",
                bytes.len()
            ))),
        }
    }
}

/// Credential attached to every call.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    /// Bearer token.
    pub token: String,
    /// Map the token is scoped to; sent as the `mapId` query parameter.
    pub map_id: Option<String>,
}

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            map_id: None,
        }
    }

    pub fn with_map_id(mut self, map_id: impl Into<String>) -> Self {
        self.map_id = Some(map_id.into());
        self
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("map_id", &self.map_id)
            .finish()
    }
}
