//! In-memory cache store using DashMap

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashcache_core::{CacheEntry, CacheStats, CacheStore, Result};

use super::ttl_index::TtlIndex;

/// Configuration for the memory store
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Maximum number of entries (0 = unlimited)
    pub max_capacity: usize,
    /// Suggested interval for calling [`MemoryStore::cleanup_expired`]
    pub cleanup_interval: Duration,
    /// Maximum TTL supported (for TTL index sizing)
    pub max_ttl: Duration,
    /// Enable TTL index for efficient expiration
    pub enable_ttl_index: bool,
    /// Slot width of the TTL index
    pub ttl_resolution: Duration,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            cleanup_interval: Duration::from_secs(60),
            max_ttl: Duration::from_secs(3600),
            enable_ttl_index: true,
            ttl_resolution: Duration::from_secs(1),
        }
    }
}

impl MemoryConfig {
    /// Create config with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            max_capacity: capacity,
            ..Default::default()
        }
    }

    /// Create config with unlimited capacity
    pub fn unlimited() -> Self {
        Self {
            max_capacity: 0,
            ..Default::default()
        }
    }
}

/// Internal statistics tracking
#[derive(Debug, Default)]
struct MemoryStats {
    hits: u64,
    misses: u64,
    writes: u64,
    deletes: u64,
    evictions: u64,
}

/// In-memory cache store
///
/// Expired entries are never returned: the TTL is checked on every read and
/// the time wheel only reclaims memory. Cloning creates a new handle to the
/// SAME underlying map.
#[derive(Clone)]
pub struct MemoryStore {
    data: Arc<DashMap<String, CacheEntry<Vec<u8>>>>,
    ttl_index: Arc<Mutex<TtlIndex>>,
    stats: Arc<RwLock<MemoryStats>>,
    config: MemoryConfig,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new(config: MemoryConfig) -> Self {
        let ttl_index = TtlIndex::new(config.ttl_resolution, config.max_ttl);

        Self {
            data: Arc::new(DashMap::with_capacity(config.max_capacity.min(10_000))),
            ttl_index: Arc::new(Mutex::new(ttl_index)),
            stats: Arc::new(RwLock::new(MemoryStats::default())),
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(MemoryConfig::default())
    }

    /// Make room for one more key if at capacity
    fn maybe_evict(&self, incoming: &str) {
        if self.config.max_capacity == 0
            || self.data.len() < self.config.max_capacity
            || self.data.contains_key(incoming)
        {
            return;
        }

        // Oldest entries go first
        let mut by_age: Vec<(String, SystemTime)> = self
            .data
            .iter()
            .map(|entry| (entry.key().clone(), entry.created_at))
            .collect();
        by_age.sort_by_key(|(_, created)| *created);

        let excess = self.data.len() + 1 - self.config.max_capacity;
        for (key, _) in by_age.into_iter().take(excess) {
            if self.remove_entry(&key) {
                self.stats.write().evictions += 1;
            }
        }
    }

    /// Remove an entry and its TTL schedule
    fn remove_entry(&self, key: &str) -> bool {
        let removed = self.data.remove(key).is_some();
        if removed {
            self.ttl_index.lock().remove(key);
        }
        removed
    }

    /// Reclaim entries whose TTL has elapsed, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let due = self.ttl_index.lock().tick();
        let mut count = 0;

        for key in due {
            let Some(remaining) = self.data.get(&key).map(|entry| entry.ttl_remaining()) else {
                continue;
            };

            match remaining {
                // Due by the wheel but still live: TTLs beyond `max_ttl` are
                // clamped, so put the key back for the time it has left.
                Some(left) if !left.is_zero() => {
                    self.ttl_index.lock().schedule(key, left);
                }
                _ => {
                    if self.remove_entry(&key) {
                        self.stats.write().evictions += 1;
                        count += 1;
                    }
                }
            }
        }

        count
    }

    /// Number of keys waiting in the TTL index
    pub fn scheduled(&self) -> usize {
        self.ttl_index.lock().len()
    }

    /// Get approximate memory usage
    pub fn memory_usage(&self) -> usize {
        self.data
            .iter()
            .map(|entry| entry.size + entry.key().len())
            .sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry<Vec<u8>>>> {
        let Some(mut entry) = self.data.get_mut(key) else {
            self.stats.write().misses += 1;
            return Ok(None);
        };

        if entry.is_expired() {
            drop(entry);
            if self.remove_entry(key) {
                self.stats.write().evictions += 1;
            }
            self.stats.write().misses += 1;
            return Ok(None);
        }

        entry.last_accessed = SystemTime::now();
        entry.access_count += 1;
        let found = entry.clone();
        drop(entry);

        self.stats.write().hits += 1;
        Ok(Some(found))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.maybe_evict(key);

        let size = value.len();
        let entry = CacheEntry::with_ttl(value, size, ttl);

        if self.config.enable_ttl_index {
            self.ttl_index.lock().schedule(key.to_string(), ttl);
        }

        self.data.insert(key.to_string(), entry);
        self.stats.write().writes += 1;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        if self.remove_entry(key) {
            self.stats.write().deletes += 1;
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self
            .data
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false))
    }

    async fn clear(&self) -> Result<()> {
        self.data.clear();
        self.ttl_index.lock().clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let stats = self.stats.read();
        Ok(CacheStats {
            hits: stats.hits,
            misses: stats.misses,
            writes: stats.writes,
            deletes: stats.deletes,
            evictions: stats.evictions,
            size: self.data.len(),
            memory_bytes: self.memory_usage(),
        })
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.data.len())
    }
}
