//! Key-value stores for sessions, relationship lookups and answers
//!
//! Everything persistent goes through [`KeyValueStore`], a small async
//! get/put/delete/keys interface over JSON strings. Three backends exist:
//!
//! - [`MemoryStore`]: process-local map, used by tests and `--storage memory`
//! - [`JsonFileStore`]: a single JSON document on disk, rewritten atomically
//! - [`RedisStore`]: Redis through a deadpool connection pool
//!
//! # Example
//!
//! ```rust,ignore
//! use storyground::cache::{AnswerCache, MemoryStore, StoreExt};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! store.put_json("greeting", &"hello").await?;
//!
//! let answers = AnswerCache::new(store.clone());
//! let hit = answers.get("session-1", "Who is the hero?").await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::validation::ValidationOutcome;

mod file;
mod memory;
mod redis_store;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Key prefix for cached answers
const ANSWER_PREFIX: &str = "answer:";

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored value is not valid JSON for the requested type
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Redis command failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Connection pool could not be built or hand out a connection
    #[error("Redis pool error: {0}")]
    Pool(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Network-backed failures may succeed on retry
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Redis(_) | Self::Pool(_))
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Async key-value store over JSON-encoded strings
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Get the raw value stored under `key`
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store a raw JSON value under `key`, replacing any previous value
    async fn put(&self, key: &str, value: String) -> StoreResult<()>;

    /// Remove `key`; returns true if it existed
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// All keys starting with `prefix`, sorted
    async fn keys(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

/// Typed JSON helpers for every [`KeyValueStore`]
#[async_trait]
pub trait StoreExt: KeyValueStore {
    /// Get and decode a value
    async fn get_json<T>(&self, key: &str) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode and store a value
    async fn put_json<T>(&self, key: &str, value: &T) -> StoreResult<()>
    where
        T: Serialize + Sync,
    {
        let raw = serde_json::to_string(value)?;
        self.put(key, raw).await
    }
}

impl<S: KeyValueStore + ?Sized> StoreExt for S {}

/// SHA-256 hex digest used for cache keys
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A validated answer kept for repeated questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAnswer {
    pub text: String,
    pub outcome: ValidationOutcome,
    #[serde(default)]
    pub referenced_concepts: Vec<String>,
    pub cached_at: DateTime<Utc>,
}

/// Answer cache keyed by a hash of session id and question text
///
/// Entries are never invalidated; a new story gets a new session id.
#[derive(Clone)]
pub struct AnswerCache {
    store: Arc<dyn KeyValueStore>,
}

impl AnswerCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cache key for a session/question pair
    pub fn key(session_id: &str, question: &str) -> String {
        format!(
            "{ANSWER_PREFIX}{}",
            hash_content(&format!("{session_id}_{question}"))
        )
    }

    /// Look up a cached answer
    pub async fn get(&self, session_id: &str, question: &str) -> StoreResult<Option<CachedAnswer>> {
        let key = Self::key(session_id, question);
        let hit = self.store.get_json::<CachedAnswer>(&key).await?;
        if hit.is_some() {
            tracing::debug!(session_id, key = %key, "Answer cache hit");
        }
        Ok(hit)
    }

    /// Store an answer
    pub async fn put(&self, session_id: &str, question: &str, answer: &CachedAnswer) -> StoreResult<()> {
        self.store
            .put_json(&Self::key(session_id, question), answer)
            .await
    }

    /// Number of cached answers
    pub async fn len(&self) -> StoreResult<usize> {
        Ok(self.store.keys(ANSWER_PREFIX).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(text: &str) -> CachedAnswer {
        CachedAnswer {
            text: text.to_string(),
            outcome: ValidationOutcome::Accepted,
            referenced_concepts: vec!["dragon".to_string()],
            cached_at: Utc::now(),
        }
    }

    #[test]
    fn test_hash_content() {
        let hash1 = hash_content("test content");
        let hash2 = hash_content("test content");
        let hash3 = hash_content("different content");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.len(), 64); // SHA256 hex
    }

    #[test]
    fn test_answer_key_depends_on_session() {
        let a = AnswerCache::key("s1", "Who fought?");
        let b = AnswerCache::key("s2", "Who fought?");
        assert_ne!(a, b);
        assert!(a.starts_with(ANSWER_PREFIX));
        assert_eq!(a, AnswerCache::key("s1", "Who fought?"));
    }

    #[tokio::test]
    async fn test_store_ext_round_trip() {
        let store = MemoryStore::new();
        store.put_json("n", &vec![1, 2, 3]).await.unwrap();
        let back: Option<Vec<i32>> = store.get_json("n").await.unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));

        let missing: Option<Vec<i32>> = store.get_json("absent").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_store_ext_decode_error() {
        let store = MemoryStore::new();
        store.put("n", "\"text\"".to_string()).await.unwrap();
        let result = store.get_json::<u32>("n").await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_answer_cache() {
        let cache = AnswerCache::new(Arc::new(MemoryStore::new()));
        assert!(cache.get("s1", "q").await.unwrap().is_none());

        cache.put("s1", "q", &answer("The knight won.")).await.unwrap();
        let hit = cache.get("s1", "q").await.unwrap().unwrap();
        assert_eq!(hit.text, "The knight won.");
        assert!(cache.get("s2", "q").await.unwrap().is_none());
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[test]
    fn test_store_error_recoverable() {
        let err = StoreError::Pool("timeout".to_string());
        assert!(err.is_recoverable());
        let err = StoreError::io("x.json", std::io::Error::other("boom"));
        assert!(!err.is_recoverable());
    }
}
