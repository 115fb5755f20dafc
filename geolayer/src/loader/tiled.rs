//! Batched per-tile feature loading.

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use super::plan::{plan_requests, LoadLimits, LoadRequest};
use super::StepOutcome;
use crate::api::{
    ApiClient, ApiError, Credential, QueryParams, TileBatchBody, TilePage, TileParam,
    TILE_ENDPOINT,
};
use crate::cache::FeatureCache;
use crate::coord::Tile;

/// Maximum number of tiles sent in one request.
pub const TILE_BATCH_SIZE: usize = 10;

/// Fetches the next page for every visible tile that still has data.
///
/// A step is all-or-nothing: pages are buffered until every batch of the
/// step has succeeded, then merged into the cache together.
#[derive(Debug, Clone)]
pub struct FeatureLoader {
    params: QueryParams,
    filter: Option<Value>,
    credential: Option<Credential>,
    limits: LoadLimits,
}

impl FeatureLoader {
    pub fn new(params: QueryParams, limits: LoadLimits) -> Self {
        Self {
            params,
            filter: None,
            credential: None,
            limits,
        }
    }

    /// Attach a server-side property filter.
    pub fn with_filter(mut self, filter: Option<Value>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn limits(&self) -> &LoadLimits {
        &self.limits
    }

    /// Runs one load step and reports whether new data was fetched.
    pub async fn load_step<C: ApiClient>(
        &self,
        tiles: &[Tile],
        cache: &mut FeatureCache,
        client: &C,
    ) -> bool {
        self.try_load_step(tiles, cache, client)
            .await
            .fetched_any()
    }

    /// Runs one load step and reports what happened.
    pub async fn try_load_step<C: ApiClient>(
        &self,
        tiles: &[Tile],
        cache: &mut FeatureCache,
        client: &C,
    ) -> StepOutcome {
        let requests = plan_requests(tiles, cache, &self.limits);
        if requests.is_empty() {
            return StepOutcome::NothingToLoad;
        }

        debug!(
            tiles = requests.len(),
            batches = requests.len().div_ceil(TILE_BATCH_SIZE),
            "Loading tile pages"
        );

        let mut pages: Vec<(Tile, TilePage)> = Vec::with_capacity(requests.len());
        for batch in requests.chunks(TILE_BATCH_SIZE) {
            match self.fetch_batch(batch, client).await {
                Ok(batch_pages) => pages.extend(batch_pages),
                Err(error) => {
                    warn!(
                        error = %error,
                        batch_size = batch.len(),
                        "Tile batch failed, discarding this step"
                    );
                    return StepOutcome::Failed(error);
                }
            }
        }

        let now = Instant::now();
        let merged_tiles = pages.len();
        let mut merged_features = 0;
        for (tile, page) in pages {
            let cursor = page.cursor();
            merged_features += page.result.features.len();
            cache.merge(tile.key(), page.result.features, page.size, cursor, now);
        }

        debug!(
            tiles = merged_tiles,
            features = merged_features,
            "Merged tile pages into cache"
        );

        StepOutcome::Loaded {
            tiles: merged_tiles,
            features: merged_features,
        }
    }

    /// Request one batch and pair each response entry with its tile.
    ///
    /// Entries that are missing or fail to parse are skipped; only a failed
    /// request or a non-array body fails the batch.
    async fn fetch_batch<C: ApiClient>(
        &self,
        batch: &[LoadRequest],
        client: &C,
    ) -> Result<Vec<(Tile, TilePage)>, ApiError> {
        let body = TileBatchBody {
            params: &self.params,
            property_filter: self.filter.as_ref(),
            tiles: batch
                .iter()
                .map(|request| TileParam {
                    tile_id: request.tile,
                    page_start: request.page_start.clone(),
                })
                .collect(),
        };
        let body = serde_json::to_value(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        let response = client
            .post(TILE_ENDPOINT, &body, self.credential.as_ref())
            .await?
            .into_json()?;

        let Value::Array(entries) = response else {
            return Err(ApiError::UnexpectedResponse(
                "tile response is not an array".to_string(),
            ));
        };

        let mut pages = Vec::with_capacity(batch.len());
        let mut entries = entries.into_iter();
        for request in batch {
            let Some(entry) = entries.next() else {
                warn!(tile = %request.tile, "Tile missing from batch response, skipping");
                continue;
            };
            match serde_json::from_value::<TilePage>(entry) {
                Ok(page) => pages.push((request.tile, page)),
                Err(e) => {
                    warn!(tile = %request.tile, error = %e, "Malformed tile page, skipping");
                }
            }
        }
        Ok(pages)
    }
}
