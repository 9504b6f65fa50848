//! Caching wrapper for relationship lookups

use async_trait::async_trait;
use std::sync::Arc;

use super::{FetchError, FetchedRelation, RelationFetcher};
use crate::cache::{KeyValueStore, StoreExt};

/// Serves lookups from a store, falling through to an inner fetcher on a miss
///
/// Only successful lookups are cached, so a transient failure is retried the
/// next time the concept comes up. Entries never expire.
pub struct CachedFetcher<F> {
    inner: F,
    store: Arc<dyn KeyValueStore>,
}

impl<F: RelationFetcher> CachedFetcher<F> {
    pub fn new(inner: F, store: Arc<dyn KeyValueStore>) -> Self {
        Self { inner, store }
    }

    /// Cache key for a `(concept, limit)` pair
    pub fn cache_key(concept: &str, limit: usize) -> String {
        format!("{concept}_{limit}")
    }
}

#[async_trait]
impl<F: RelationFetcher> RelationFetcher for CachedFetcher<F> {
    async fn try_fetch(
        &self,
        concept: &str,
        limit: usize,
    ) -> Result<Vec<FetchedRelation>, FetchError> {
        let key = Self::cache_key(concept, limit);

        match self.store.get_json::<Vec<FetchedRelation>>(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(concept, "Relation cache hit");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(concept, error = %e, "Relation cache read failed"),
        }

        let relations = self.inner.try_fetch(concept, limit).await?;

        if let Err(e) = self.store.put_json(&key, &relations).await {
            tracing::warn!(concept, error = %e, "Failed to cache relations");
        }
        Ok(relations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl RelationFetcher for CountingFetcher {
        async fn try_fetch(
            &self,
            concept: &str,
            _limit: usize,
        ) -> Result<Vec<FetchedRelation>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::ServerError(503));
            }
            Ok(vec![FetchedRelation {
                start: concept.to_string(),
                end: "thing".to_string(),
                relation: "IsA".to_string(),
                weight: 2.0,
            }])
        }
    }

    #[tokio::test]
    async fn test_second_lookup_is_cached() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let fetcher = CachedFetcher::new(
            CountingFetcher {
                calls: AtomicUsize::new(0),
                fail: false,
            },
            store.clone(),
        );

        let first = fetcher.fetch("dragon", 5).await;
        let second = fetcher.fetch("dragon", 5).await;
        assert_eq!(first, second);
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 1);
        assert!(store.get("dragon_5").await.unwrap().is_some());

        // A different limit is a different key
        fetcher.fetch("dragon", 3).await;
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let fetcher = CachedFetcher::new(
            CountingFetcher {
                calls: AtomicUsize::new(0),
                fail: true,
            },
            store.clone(),
        );

        assert!(fetcher.fetch("dragon", 5).await.is_empty());
        assert!(fetcher.fetch("dragon", 5).await.is_empty());
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
        assert!(store.keys("").await.unwrap().is_empty());
    }
}
