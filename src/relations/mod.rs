//! Relationship lookup for story concepts
//!
//! A [`RelationFetcher`] maps one concept to a list of `(start, relation,
//! end, weight)` edges. Lookups are best effort: [`RelationFetcher::fetch`]
//! turns every failure into an empty list so story analysis never aborts
//! because the lexical service is slow or down.
//!
//! [`fetch_all`] fans lookups out over a bounded number of in-flight
//! requests and joins them back into a [`RelationMap`] in concept order.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod cached;
mod conceptnet;

pub use cached::CachedFetcher;
pub use conceptnet::{ConceptNetClient, DEFAULT_ENDPOINT as CONCEPTNET_ENDPOINT};

/// Default number of edges requested per concept
pub const DEFAULT_RELATION_LIMIT: usize = 5;

/// Default number of lookups in flight
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Errors from a single relationship lookup
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Response body did not have the expected shape
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Cache read or write failed
    #[error("Cache error: {0}")]
    Cache(#[from] crate::cache::StoreError),
}

impl FetchError {
    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(e) if e.is_timeout() => "timeout",
            Self::Http(_) => "http",
            Self::ServerError(_) => "status",
            Self::Decode(_) => "decode",
            Self::Cache(_) => "cache",
        }
    }
}

/// One edge returned by a relationship lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedRelation {
    pub start: String,
    pub end: String,
    pub relation: String,
    pub weight: f64,
}

/// Fetched relations per concept, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationMap(Vec<(String, Vec<FetchedRelation>)>);

impl RelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the relations for a concept, replacing an earlier entry in place
    pub fn insert(&mut self, concept: impl Into<String>, relations: Vec<FetchedRelation>) {
        let concept = concept.into();
        match self.0.iter_mut().find(|(c, _)| *c == concept) {
            Some(entry) => entry.1 = relations,
            None => self.0.push((concept, relations)),
        }
    }

    /// Relations for a concept
    pub fn get(&self, concept: &str) -> Option<&[FetchedRelation]> {
        self.0
            .iter()
            .find(|(c, _)| c == concept)
            .map(|(_, r)| r.as_slice())
    }

    /// Iterate `(concept, relations)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FetchedRelation])> {
        self.0.iter().map(|(c, r)| (c.as_str(), r.as_slice()))
    }

    /// Number of concepts
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of edges across all concepts
    pub fn edge_count(&self) -> usize {
        self.0.iter().map(|(_, r)| r.len()).sum()
    }
}

/// Source of relationships for a concept
#[async_trait]
pub trait RelationFetcher: Send + Sync {
    /// Look up at most `limit` edges for `concept`
    async fn try_fetch(&self, concept: &str, limit: usize)
        -> Result<Vec<FetchedRelation>, FetchError>;

    /// Like [`try_fetch`](Self::try_fetch), but failures become an empty list
    async fn fetch(&self, concept: &str, limit: usize) -> Vec<FetchedRelation> {
        match self.try_fetch(concept, limit).await {
            Ok(relations) => relations,
            Err(e) => {
                tracing::warn!(concept, error = %e, "Relationship lookup failed, using no relations");
                crate::metrics::record_fetch_failure(e.kind());
                Vec::new()
            }
        }
    }
}

/// Fetch relations for every concept with at most `concurrency` lookups in flight
///
/// Returns once every lookup has finished. Every concept gets an entry, empty
/// if its lookup failed.
pub async fn fetch_all<F>(
    fetcher: &F,
    concepts: &[String],
    limit: usize,
    concurrency: usize,
) -> RelationMap
where
    F: RelationFetcher + ?Sized,
{
    let results: Vec<(String, Vec<FetchedRelation>)> = stream::iter(concepts)
        .map(|concept| async move { (concept.clone(), fetcher.fetch(concept, limit).await) })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut map = RelationMap::new();
    for (concept, relations) in results {
        map.insert(concept, relations);
    }

    tracing::debug!(
        concepts = map.len(),
        edges = map.edge_count(),
        "Fetched concept relations"
    );
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn rel(start: &str, relation: &str, end: &str) -> FetchedRelation {
        FetchedRelation {
            start: start.to_string(),
            end: end.to_string(),
            relation: relation.to_string(),
            weight: 1.0,
        }
    }

    struct StaticFetcher {
        table: HashMap<&'static str, Vec<FetchedRelation>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl StaticFetcher {
        fn new() -> Self {
            let mut table = HashMap::new();
            table.insert("dragon", vec![rel("dragon", "IsA", "monster")]);
            table.insert("sword", vec![rel("sword", "UsedFor", "fighting")]);
            Self {
                table,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RelationFetcher for StaticFetcher {
        async fn try_fetch(
            &self,
            concept: &str,
            limit: usize,
        ) -> Result<Vec<FetchedRelation>, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.table.get(concept) {
                Some(r) => Ok(r.iter().take(limit).cloned().collect()),
                None => Err(FetchError::ServerError(500)),
            }
        }
    }

    #[test]
    fn test_relation_map_insert_replaces_in_place() {
        let mut map = RelationMap::new();
        map.insert("a", vec![rel("a", "IsA", "b")]);
        map.insert("c", vec![]);
        map.insert("a", vec![]);

        let order: Vec<&str> = map.iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec!["a", "c"]);
        assert_eq!(map.edge_count(), 0);
        assert!(map.get("a").unwrap().is_empty());
        assert!(map.get("zzz").is_none());
    }

    #[tokio::test]
    async fn test_fetch_swallows_errors() {
        let fetcher = StaticFetcher::new();
        assert!(fetcher.fetch("unknown", 5).await.is_empty());
        assert_eq!(fetcher.fetch("dragon", 5).await.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_concept_order_and_failures() {
        let fetcher = StaticFetcher::new();
        let concepts: Vec<String> = ["sword", "ghost", "dragon"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let map = fetch_all(&fetcher, &concepts, 5, 2).await;
        let order: Vec<&str> = map.iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec!["sword", "ghost", "dragon"]);
        assert!(map.get("ghost").unwrap().is_empty());
        assert_eq!(map.edge_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_all_bounds_concurrency() {
        let fetcher = StaticFetcher::new();
        let concepts: Vec<String> = (0..12).map(|i| format!("c{i}")).collect();
        let map = fetch_all(&fetcher, &concepts, 5, 3).await;
        assert_eq!(map.len(), 12);
        assert!(fetcher.peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn test_fetch_error_kind() {
        assert_eq!(FetchError::ServerError(503).kind(), "status");
        assert_eq!(FetchError::Decode("x".into()).kind(), "decode");
    }
}
