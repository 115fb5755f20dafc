//! Remote geometry API access.
//!
//! The loader only depends on the [`ApiClient`] trait; [`ReqwestApiClient`]
//! is the production implementation.
//!
//! ```ignore
//! use geolayer::api::{ApiClient, Credential, ReqwestApiClient};
//!
//! let client = ReqwestApiClient::new()?;
//! let body = serde_json::json!({"mapId": "..."});
//! let response = client.post("/geometry/get", &body, Some(&Credential::bearer(token))).await?;
//! ```

mod http;
mod types;
mod wire;

pub use http::{ApiClient, ReqwestApiClient, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
pub use types::{ApiError, ApiResponse, Credential, STATUS_TOO_MANY_REQUESTS};
pub use wire::{
    FeaturePage, GlobalPage, GlobalPageBody, QueryParams, ReturnType, TileBatchBody, TilePage,
    TileParam, GLOBAL_ENDPOINT, SERVER_MAX_PAGE_SIZE, TILE_ENDPOINT,
};

#[cfg(test)]
pub use http::tests::{MockApiClient, RecordedRequest};
