//! Cache store trait

use async_trait::async_trait;
use std::time::Duration;

use crate::{CacheEntry, CacheError, CacheStats};

/// Key-value store with per-key TTL
///
/// The report engine only relies on `get`, `set` and `delete`; the remaining
/// methods exist for diagnostics and tests. Implementations include the
/// in-process memory store and Redis.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Get a value from the store
    ///
    /// Returns `None` if the key doesn't exist or its TTL has elapsed.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry<Vec<u8>>>, CacheError>;

    /// Store a value that expires after `ttl`
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Delete a key from the store
    ///
    /// Returns the number of keys that were removed (0 or 1).
    async fn delete(&self, key: &str) -> Result<u64, CacheError>;

    /// Check if a live entry exists for the key
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Clear all entries from the store
    async fn clear(&self) -> Result<(), CacheError>;

    /// Get store statistics
    async fn stats(&self) -> Result<CacheStats, CacheError>;

    /// Get the number of entries in the store
    async fn len(&self) -> Result<usize, CacheError>;

    /// Check if the store is empty
    async fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len().await? == 0)
    }
}
