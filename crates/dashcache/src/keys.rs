//! Cache keys of the dashboard reports

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashcache_core::CacheKey;
use dashmap::DashMap;

use crate::config::TopCustomersKeyPolicy;

/// Key of the cached product report
pub const PRODUCT_REPORT_KEY: &str = "dashboard:product:report";

/// Key of the cached top-customers report
pub const TOP_CUSTOMERS_KEY: &str = "dashboard:customer:top";

/// A cacheable report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKey {
    /// Product totals and recent products
    ProductReport,
    /// Customers ranked by spend; `limit` is set only for per-limit keys
    TopCustomers { limit: Option<u32> },
}

impl ReportKey {
    /// Key of the top-customers report for `limit` under `policy`
    pub fn top_customers(policy: TopCustomersKeyPolicy, limit: u32) -> Self {
        match policy {
            TopCustomersKeyPolicy::Shared => ReportKey::TopCustomers { limit: None },
            TopCustomersKeyPolicy::PerLimit => ReportKey::TopCustomers { limit: Some(limit) },
        }
    }
}

impl CacheKey for ReportKey {
    fn cache_key(&self) -> String {
        match self {
            ReportKey::ProductReport => PRODUCT_REPORT_KEY.to_string(),
            ReportKey::TopCustomers { limit: None } => TOP_CUSTOMERS_KEY.to_string(),
            ReportKey::TopCustomers { limit: Some(limit) } => {
                (TOP_CUSTOMERS_KEY, limit).cache_key()
            }
        }
    }
}

/// Eviction counter of one report
///
/// Every eviction bumps it. A recompute that started under an older value
/// must not leave its result in the cache, and callers arriving after an
/// eviction must not join a recompute that started before it.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    value: Arc<AtomicU64>,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Mark everything computed so far as outdated
    pub fn bump(&self) -> u64 {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Coalescing key for `key` under `generation`
    pub fn group_key(key: &str, generation: u64) -> String {
        format!("{}#{}", key, generation)
    }
}

/// Most per-limit keys remembered at once
pub const MAX_TRACKED_KEYS: usize = 1024;

/// Per-limit top-customers keys written by this process
///
/// Under [`TopCustomersKeyPolicy::PerLimit`] there is no single key to evict,
/// so populated keys are remembered until the next eviction or until their
/// cache entry has expired, whichever comes first. At most `capacity` keys
/// are kept; past that the entry closest to expiry is forgotten and left to
/// its TTL.
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    keys: Arc<DashMap<String, Instant>>,
    capacity: usize,
}

impl Default for KeyRegistry {
    fn default() -> Self {
        Self::with_capacity(MAX_TRACKED_KEYS)
    }
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Remember a key whose cache entry lives at most `live_for`
    pub fn record(&self, key: &str, live_for: Duration) {
        let now = Instant::now();
        self.keys.insert(key.to_string(), now + live_for);

        if self.keys.len() <= self.capacity {
            return;
        }
        self.keys.retain(|_, expires_at| *expires_at > now);

        while self.keys.len() > self.capacity {
            let soonest = self
                .keys
                .iter()
                .min_by_key(|entry| *entry.value())
                .map(|entry| entry.key().clone());
            match soonest {
                Some(key) => {
                    self.keys.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Take every remembered key whose entry may still be cached
    pub fn drain(&self) -> Vec<String> {
        let now = Instant::now();
        let keys: Vec<String> = self.keys.iter().map(|entry| entry.key().clone()).collect();

        keys.into_iter()
            .filter_map(|key| match self.keys.remove(&key) {
                Some((key, expires_at)) if expires_at > now => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_keys() {
        assert_eq!(ReportKey::ProductReport.cache_key(), "dashboard:product:report");
        assert_eq!(
            ReportKey::top_customers(TopCustomersKeyPolicy::Shared, 25).cache_key(),
            "dashboard:customer:top"
        );
    }

    #[test]
    fn test_per_limit_key() {
        let key = ReportKey::top_customers(TopCustomersKeyPolicy::PerLimit, 25);
        assert_eq!(key.cache_key(), "dashboard:customer:top:25");
    }

    const LIVE: Duration = Duration::from_secs(300);

    #[test]
    fn test_registry_drain_empties() {
        let registry = KeyRegistry::new();
        registry.record("dashboard:customer:top:5", LIVE);
        registry.record("dashboard:customer:top:5", LIVE);
        registry.record("dashboard:customer:top:10", LIVE);
        assert_eq!(registry.len(), 2);

        let mut drained = registry.drain();
        drained.sort();
        assert_eq!(drained, ["dashboard:customer:top:10", "dashboard:customer:top:5"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_forgets_expired_keys() {
        let registry = KeyRegistry::with_capacity(2);
        registry.record("dashboard:customer:top:1", Duration::ZERO);
        registry.record("dashboard:customer:top:2", Duration::ZERO);
        registry.record("dashboard:customer:top:3", LIVE);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.drain(), ["dashboard:customer:top:3"]);
    }

    #[test]
    fn test_registry_bounded_under_many_limits() {
        let registry = KeyRegistry::with_capacity(16);
        for limit in 1..=500u32 {
            let live_for = LIVE + Duration::from_secs(limit as u64);
            registry.record(&format!("dashboard:customer:top:{}", limit), live_for);
        }

        assert_eq!(registry.len(), 16);
        // The longest-lived keys are the ones kept
        let mut drained = registry.drain();
        drained.sort();
        assert!(drained.contains(&"dashboard:customer:top:500".to_string()));
        assert!(!drained.contains(&"dashboard:customer:top:1".to_string()));
    }

    #[test]
    fn test_generation_changes_group_key() {
        let generation = Generation::new();
        let before = generation.current();
        assert_eq!(generation.bump(), before + 1);
        assert_ne!(
            Generation::group_key(PRODUCT_REPORT_KEY, before),
            Generation::group_key(PRODUCT_REPORT_KEY, generation.current())
        );

        let shared = generation.clone();
        shared.bump();
        assert_eq!(generation.current(), before + 2);
    }
}
