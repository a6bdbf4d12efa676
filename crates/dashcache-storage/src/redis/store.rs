use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use parking_lot::RwLock;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;

use dashcache_core::{CacheEntry, CacheError, CacheStats, CacheStore, Result};

use super::config::RedisConfig;

/// Expiry for `SET PX`
///
/// Sub-millisecond TTLs round up to one millisecond; zero would be rejected.
fn expiry_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Redis cache store
///
/// Each payload is wrapped in a [`CacheEntry`] envelope (JSON) and written
/// with `SET PX`, so expiry is enforced by Redis itself.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool<RedisConnectionManager>,
    config: RedisConfig,
    stats: Arc<RwLock<CacheStats>>,
}

impl RedisStore {
    /// Connect and build the connection pool
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let manager = RedisConnectionManager::new(config.url.as_str())
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            config,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        })
    }

    async fn connection(&self) -> Result<PooledConnection<'_, RedisConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }

    fn scan_pattern(&self) -> String {
        self.config.prefixed_key("*")
    }

    async fn scan_keys(&self) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let pattern = self.scan_pattern();
        let mut cursor = 0u64;
        let mut found = Vec::new();

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .cursor_arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(1000)
                .query_async(&mut *conn)
                .await
                .map_err(|e| CacheError::Backend(e.to_string()))?;

            found.extend(keys);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(found)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry<Vec<u8>>>> {
        let mut conn = self.connection().await?;
        let prefixed = self.config.prefixed_key(key);

        let bytes: Option<Vec<u8>> = conn
            .get(&prefixed)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        match bytes {
            Some(data) => {
                let entry: CacheEntry<Vec<u8>> = serde_json::from_slice(&data)
                    .map_err(|e| CacheError::Deserialization(e.to_string()))?;
                self.stats.write().hits += 1;
                Ok(Some(entry))
            }
            None => {
                self.stats.write().misses += 1;
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;

        let size = value.len();
        let envelope = serde_json::to_vec(&CacheEntry::with_ttl(value, size, ttl))
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        let _: () = conn
            .pset_ex(self.config.prefixed_key(key), envelope, expiry_millis(ttl))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        self.stats.write().writes += 1;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        let mut conn = self.connection().await?;

        let deleted: u64 = conn
            .del(self.config.prefixed_key(key))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        self.stats.write().deletes += deleted;
        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        conn.exists(self.config.prefixed_key(key))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn clear(&self) -> Result<()> {
        let keys = self.scan_keys().await?;
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection().await?;
        let _: usize = conn
            .unlink(&keys)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        Ok(self.stats.read().clone())
    }

    async fn len(&self) -> Result<usize> {
        if self.config.key_prefix.is_some() {
            return Ok(self.scan_keys().await?.len());
        }

        let mut conn = self.connection().await?;
        redis::cmd("DBSIZE")
            .query_async(&mut *conn)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_keeps_millisecond_precision() {
        assert_eq!(expiry_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(expiry_millis(Duration::from_millis(250)), 250);
        assert_eq!(expiry_millis(Duration::from_secs(300)), 300_000);
    }

    #[test]
    fn test_expiry_never_zero() {
        assert_eq!(expiry_millis(Duration::ZERO), 1);
        assert_eq!(expiry_millis(Duration::from_micros(300)), 1);
    }
}
