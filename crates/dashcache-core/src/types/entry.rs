//! Cache entry type

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// A cached entry with its metadata
///
/// Entries carry no version; staleness is bounded by `ttl` and explicit
/// eviction only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached value
    pub value: T,
    /// When the entry was created
    pub created_at: SystemTime,
    /// When the entry was last accessed
    pub last_accessed: SystemTime,
    /// Number of times accessed
    pub access_count: u64,
    /// Time-to-live
    pub ttl: Option<Duration>,
    /// Size in bytes
    pub size: usize,
}

impl<T> CacheEntry<T> {
    /// Create a new cache entry
    pub fn new(value: T, size: usize) -> Self {
        let now = SystemTime::now();
        Self {
            value,
            created_at: now,
            last_accessed: now,
            access_count: 0,
            ttl: None,
            size,
        }
    }

    /// Create entry with TTL
    pub fn with_ttl(value: T, size: usize, ttl: Duration) -> Self {
        let mut entry = Self::new(value, size);
        entry.ttl = Some(ttl);
        entry
    }

    /// Check if entry has expired
    pub fn is_expired(&self) -> bool {
        if let Some(ttl) = self.ttl {
            if let Ok(elapsed) = self.created_at.elapsed() {
                return elapsed > ttl;
            }
        }
        false
    }

    /// Get remaining TTL
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.ttl.and_then(|ttl| {
            self.created_at
                .elapsed()
                .ok()
                .and_then(|elapsed| ttl.checked_sub(elapsed))
        })
    }

    /// Get age of the entry
    pub fn age(&self) -> Duration {
        self.created_at.elapsed().unwrap_or_default()
    }

    /// Replace the value, keeping the metadata
    pub fn map<U, F>(self, f: F) -> CacheEntry<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheEntry {
            value: f(self.value),
            created_at: self.created_at,
            last_accessed: self.last_accessed,
            access_count: self.access_count,
            ttl: self.ttl,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let entry = CacheEntry::new(b"payload".to_vec(), 7);
        assert_eq!(entry.access_count, 0);
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining().is_none());
    }

    #[test]
    fn test_entry_with_ttl() {
        let entry = CacheEntry::with_ttl("report", 6, Duration::from_secs(300));
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining().unwrap() <= Duration::from_secs(300));
    }

    #[test]
    fn test_entry_past_ttl_is_expired() {
        let mut entry = CacheEntry::with_ttl(1u8, 1, Duration::from_secs(300));
        entry.created_at = SystemTime::now() - Duration::from_secs(301);
        assert!(entry.is_expired());
        assert!(entry.ttl_remaining().is_none());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let entry = CacheEntry::with_ttl(21, 4, Duration::from_secs(60));
        let created = entry.created_at;
        let mapped = entry.map(|v| v * 2);
        assert_eq!(mapped.value, 42);
        assert_eq!(mapped.created_at, created);
        assert_eq!(mapped.ttl, Some(Duration::from_secs(60)));
    }
}
