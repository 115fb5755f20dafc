//! Load-all mode: paging through the whole dataset with one cursor.

use tracing::{debug, info, warn};

use super::StepOutcome;
use crate::api::{ApiClient, ApiError, Credential, GlobalPage, GlobalPageBody, QueryParams, GLOBAL_ENDPOINT};
use crate::cache::PageCursor;
use crate::feature::Feature;

/// Walks a single page cursor across the dataset, ignoring tiles.
#[derive(Debug, Clone)]
pub struct GlobalLoader {
    params: QueryParams,
    credential: Option<Credential>,
    cursor: PageCursor,
    features: Vec<Feature>,
}

impl GlobalLoader {
    pub fn new(params: QueryParams) -> Self {
        Self {
            params,
            credential: None,
            cursor: PageCursor::NotStarted,
            features: Vec::new(),
        }
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    /// Every feature loaded so far, in arrival order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Whether the server has signalled the end of the data.
    pub fn is_complete(&self) -> bool {
        self.cursor.is_exhausted()
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// Fetch the next page, returning whether anything was fetched.
    pub async fn load_step<C: ApiClient>(&mut self, client: &C) -> bool {
        self.try_load_step(client).await.fetched_any()
    }

    /// Fetch the next page.
    pub async fn try_load_step<C: ApiClient>(&mut self, client: &C) -> StepOutcome {
        if self.is_complete() {
            return StepOutcome::NothingToLoad;
        }

        match self.fetch_page(client).await {
            Ok(page) => {
                let features = page.result.map(|r| r.features).unwrap_or_default();
                let count = features.len();
                self.features.extend(features);
                self.cursor = PageCursor::from_server(page.next_page_start);

                debug!(features = count, total = self.features.len(), "Loaded dataset page");
                if self.is_complete() {
                    info!(total = self.features.len(), "Finished loading dataset");
                }

                StepOutcome::Loaded { tiles: 0, features: count }
            }
            Err(error) => {
                warn!(error = %error, "Dataset page request failed");
                StepOutcome::Failed(error)
            }
        }
    }

    async fn fetch_page<C: ApiClient>(&self, client: &C) -> Result<GlobalPage, ApiError> {
        let body = GlobalPageBody {
            params: &self.params,
            page_start: self.cursor.token(),
        };
        let body = serde_json::to_value(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        let response = client
            .post(GLOBAL_ENDPOINT, &body, self.credential.as_ref())
            .await?
            .into_json()?;

        serde_json::from_value(response).map_err(|e| ApiError::UnexpectedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockApiClient, ReturnType};
    use serde_json::json;

    fn loader() -> GlobalLoader {
        GlobalLoader::new(QueryParams {
            resource_id: "block".to_string(),
            layer_id: "layer".to_string(),
            return_type: ReturnType::Center,
            zip: true,
            page_size: 3000,
            style_id: None,
            style: None,
        })
    }

    #[tokio::test]
    async fn test_walks_until_end_of_data() {
        let client = MockApiClient::new();
        client.push_json(json!({"result": {"features": [{"id": 1}, {"id": 2}]}, "nextPageStart": 2}));
        client.push_json(json!({"result": {"features": [{"id": 3}]}, "nextPageStart": null}));
        let mut loader = loader();

        assert!(loader.load_step(&client).await);
        assert!(!loader.is_complete());
        assert!(loader.load_step(&client).await);
        assert!(loader.is_complete());
        assert!(!loader.load_step(&client).await);

        assert_eq!(loader.features().len(), 3);
        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, GLOBAL_ENDPOINT);
        assert!(requests[0].body.get("pageStart").is_none());
        assert_eq!(requests[1].body["pageStart"], json!(2));
        assert_eq!(requests[1].body["returnType"], json!("center"));
    }

    #[tokio::test]
    async fn test_failure_keeps_cursor() {
        let client = MockApiClient::new();
        client.push_json(json!({"result": {"features": [{"id": 1}]}, "nextPageStart": "p2"}));
        client.push_error(ApiError::Transport("reset".to_string()));
        let mut loader = loader();

        assert!(loader.load_step(&client).await);
        let outcome = loader.try_load_step(&client).await;

        assert!(matches!(outcome, StepOutcome::Failed(ApiError::Transport(_))));
        assert_eq!(loader.cursor().token().map(|t| t.as_value()), Some(&json!("p2")));
        assert_eq!(loader.features().len(), 1);
    }

    #[tokio::test]
    async fn test_page_without_result_ends_walk() {
        let client = MockApiClient::new();
        client.push_json(json!({}));
        let mut loader = loader();

        assert!(loader.load_step(&client).await);
        assert!(loader.is_complete());
        assert!(loader.features().is_empty());
    }
}
