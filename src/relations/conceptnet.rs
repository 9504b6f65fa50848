//! ConceptNet HTTP client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{FetchError, FetchedRelation, RelationFetcher};

/// Public ConceptNet API
pub const DEFAULT_ENDPOINT: &str = "http://api.conceptnet.io";

/// Relation label used when an edge has none
const DEFAULT_RELATION: &str = "related";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    edges: Vec<RawEdge>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNode {
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    #[serde(default)]
    start: RawNode,
    #[serde(default)]
    end: RawNode,
    #[serde(default)]
    rel: RawNode,
    weight: Option<f64>,
}

impl From<RawEdge> for FetchedRelation {
    fn from(edge: RawEdge) -> Self {
        Self {
            start: edge.start.label.unwrap_or_default(),
            end: edge.end.label.unwrap_or_default(),
            relation: edge
                .rel
                .label
                .unwrap_or_else(|| DEFAULT_RELATION.to_string()),
            weight: edge.weight.unwrap_or(1.0),
        }
    }
}

/// Client for the ConceptNet `/query` endpoint
pub struct ConceptNetClient {
    client: Client,
    endpoint: String,
}

impl ConceptNetClient {
    /// Create a client against the public API with a 4 second timeout
    pub fn new() -> Result<Self, FetchError> {
        Self::with_endpoint(DEFAULT_ENDPOINT, Duration::from_secs(4))
    }

    /// Create a client against a custom endpoint
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn query_url(&self, concept: &str, limit: usize) -> String {
        format!(
            "{}/query?node=/c/en/{}&limit={}",
            self.endpoint, concept, limit
        )
    }
}

#[async_trait]
impl RelationFetcher for ConceptNetClient {
    async fn try_fetch(
        &self,
        concept: &str,
        limit: usize,
    ) -> Result<Vec<FetchedRelation>, FetchError> {
        let url = self.query_url(concept, limit);
        tracing::debug!(concept, url = %url, "Querying ConceptNet");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(body
            .edges
            .into_iter()
            .take(limit)
            .map(FetchedRelation::from)
            .collect())
    }
}
