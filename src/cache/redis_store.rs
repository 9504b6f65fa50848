//! Redis-backed store

use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Connection, Pool, Runtime};
use redis::AsyncCommands;

use super::{KeyValueStore, StoreError, StoreResult};

/// Default connection pool size
const DEFAULT_POOL_SIZE: usize = 10;

/// Store keeping each entry as a Redis string under `{prefix}:{key}`
pub struct RedisStore {
    pool: Pool,
    prefix: String,
}

impl RedisStore {
    /// Connect and verify the server answers PING
    pub async fn connect(url: &str, prefix: impl Into<String>) -> StoreResult<Self> {
        let pool = PoolConfig::from_url(url)
            .builder()
            .map_err(|e| StoreError::Pool(format!("Failed to create pool builder: {e}")))?
            .max_size(DEFAULT_POOL_SIZE)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| StoreError::Pool(format!("Failed to create Redis connection pool: {e}")))?;

        let store = Self {
            pool,
            prefix: prefix.into(),
        };

        let mut conn = store.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;

        tracing::info!(url = %url, prefix = %store.prefix, "Connected to Redis");
        Ok(store)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    async fn conn(&self) -> StoreResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(self.full_key(key)).await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: String) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        conn.set::<_, _, ()>(self.full_key(key), value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let removed: u64 = conn.del(self.full_key(key)).await?;
        Ok(removed > 0)
    }

    async fn keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn().await?;
        let pattern = format!("{}*", self.full_key(prefix));
        let raw: Vec<String> = redis::cmd("KEYS")
            .arg(&pattern)
            .query_async(&mut *conn)
            .await?;

        let strip = format!("{}:", self.prefix);
        let mut keys: Vec<String> = raw
            .into_iter()
            .filter_map(|k| k.strip_prefix(&strip).map(str::to_string))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests require running Redis
    #[tokio::test]
    #[ignore = "Requires running Redis"]
    async fn test_redis_round_trip() {
        let store = RedisStore::connect("redis://localhost:6379", "storyground-test")
            .await
            .unwrap();
        store.put("k1", "\"v\"".to_string()).await.unwrap();
        assert_eq!(store.get("k1").await.unwrap().as_deref(), Some("\"v\""));
        assert!(store.keys("k").await.unwrap().contains(&"k1".to_string()));
        assert!(store.delete("k1").await.unwrap());
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let result = RedisStore::connect("redis://127.0.0.1:1", "x").await;
        assert!(result.is_err());
    }
}
