//! Best-effort typed access to the cache store

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashcache_core::{
    CacheKey, CacheMetrics, CacheOperation, CacheResult, CacheStore, JsonSerializer,
    NoopMetrics, Serializer,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

/// Typed, failure-tolerant view of a [`CacheStore`]
///
/// Nothing here returns an error: a failed or corrupt read is a miss, and a
/// failed write or eviction is logged and dropped. TTL expiry is the backstop.
pub struct ReportCache<S, Z = JsonSerializer, M = NoopMetrics>
where
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    store: Arc<S>,
    serializer: Arc<Z>,
    metrics: Arc<M>,
    namespace: Option<String>,
    ttl_jitter: f64,
}

impl<S: CacheStore> ReportCache<S, JsonSerializer, NoopMetrics> {
    /// Create with the JSON serializer and no metrics
    pub fn new(store: S) -> Self {
        Self::with_parts(Arc::new(store), JsonSerializer, NoopMetrics, None, 0.0)
    }
}

impl<S, Z, M> ReportCache<S, Z, M>
where
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    /// Create from a shared store, a serializer and a metrics sink
    pub fn with_parts(
        store: Arc<S>,
        serializer: Z,
        metrics: M,
        namespace: Option<String>,
        ttl_jitter: f64,
    ) -> Self {
        Self {
            store,
            serializer: Arc::new(serializer),
            metrics: Arc::new(metrics),
            namespace,
            ttl_jitter,
        }
    }

    /// Get the full key with namespace prefix
    pub fn full_key(&self, key: &impl CacheKey) -> String {
        let key = key.full_key();
        match &self.namespace {
            Some(ns) => format!("{}:{}", ns, key),
            None => key,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The metrics sink
    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Longest lifetime an entry written with `ttl` can have
    pub fn ttl_ceiling(&self, ttl: Duration) -> Duration {
        if self.ttl_jitter > 0.0 {
            return ttl + ttl.mul_f64(self.ttl_jitter);
        }
        ttl
    }

    fn apply_ttl_jitter(&self, ttl: Duration) -> Duration {
        if self.ttl_jitter > 0.0 {
            let extra = ttl.mul_f64(self.ttl_jitter * rand::random::<f64>());
            return ttl + extra;
        }
        ttl
    }

    /// Look up and decode a cached payload
    pub async fn probe<T>(&self, key: &str) -> CacheResult<T>
    where
        T: DeserializeOwned,
    {
        let start = Instant::now();
        let found = self.store.get(key).await;
        self.metrics.record_latency(CacheOperation::Get, start.elapsed());

        let entry = match found {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                self.metrics.record_miss(key);
                return CacheResult::Miss;
            }
            Err(err) => {
                warn!(target: "dashcache", key = %key, error = %err, "cache read failed, recomputing");
                self.metrics.record_store_failure(CacheOperation::Get);
                self.metrics.record_miss(key);
                return CacheResult::Miss;
            }
        };

        let start = Instant::now();
        let decoded = self.serializer.deserialize::<T>(&entry.value);
        self.metrics
            .record_latency(CacheOperation::Deserialize, start.elapsed());

        match decoded {
            Ok(value) => {
                self.metrics.record_hit(key);
                CacheResult::Hit(entry.map(|_| value))
            }
            Err(err) => {
                warn!(target: "dashcache", key = %key, error = %err, "cached payload unreadable, recomputing");
                self.metrics.record_miss(key);
                CacheResult::Miss
            }
        }
    }

    /// Encode and store a payload; failures are logged and swallowed
    pub async fn put<T>(&self, key: &str, value: &T, ttl: Duration)
    where
        T: Serialize,
    {
        let start = Instant::now();
        let bytes = match self.serializer.serialize(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(target: "dashcache", key = %key, error = %err, "failed to encode report for cache");
                self.metrics.record_store_failure(CacheOperation::Serialize);
                return;
            }
        };
        self.metrics
            .record_latency(CacheOperation::Serialize, start.elapsed());

        let start = Instant::now();
        if let Err(err) = self.store.set(key, bytes, self.apply_ttl_jitter(ttl)).await {
            warn!(target: "dashcache", key = %key, error = %err, "failed to write report to cache");
            self.metrics.record_store_failure(CacheOperation::Set);
            return;
        }
        self.metrics.record_latency(CacheOperation::Set, start.elapsed());
    }

    /// Delete a key; failures are logged and count as nothing evicted
    pub async fn evict(&self, key: &str) -> u64 {
        let start = Instant::now();
        match self.store.delete(key).await {
            Ok(count) => {
                self.metrics
                    .record_latency(CacheOperation::Delete, start.elapsed());
                count
            }
            Err(err) => {
                warn!(target: "dashcache", key = %key, error = %err, "failed to invalidate cached report");
                self.metrics.record_store_failure(CacheOperation::Delete);
                0
            }
        }
    }
}

impl<S, Z, M> Clone for ReportCache<S, Z, M>
where
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            serializer: self.serializer.clone(),
            metrics: self.metrics.clone(),
            namespace: self.namespace.clone(),
            ttl_jitter: self.ttl_jitter,
        }
    }
}
