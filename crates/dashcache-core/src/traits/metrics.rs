//! Metrics trait for cache observability

use std::time::Duration;

/// Store operation for latency and failure tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOperation {
    Get,
    Set,
    Delete,
    Serialize,
    Deserialize,
}

impl CacheOperation {
    /// Get operation as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOperation::Get => "get",
            CacheOperation::Set => "set",
            CacheOperation::Delete => "delete",
            CacheOperation::Serialize => "serialize",
            CacheOperation::Deserialize => "deserialize",
        }
    }
}

/// Trait for report cache metrics/observability
///
/// Implement this to integrate with your metrics system (Prometheus, StatsD, etc.)
pub trait CacheMetrics: Send + Sync + 'static {
    /// Record a cache hit
    fn record_hit(&self, key: &str);

    /// Record a cache miss (includes corrupt payloads and unreachable stores)
    fn record_miss(&self, key: &str);

    /// Record a caller that joined an in-flight recomputation
    fn record_coalesced(&self, key: &str);

    /// Record a finished recomputation
    fn record_recompute(&self, key: &str, duration: Duration, ok: bool);

    /// Record a swallowed store failure
    fn record_store_failure(&self, operation: CacheOperation);

    /// Record operation latency
    fn record_latency(&self, operation: CacheOperation, duration: Duration);
}

/// No-op metrics implementation (default)
///
/// Zero overhead when metrics are not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl CacheMetrics for NoopMetrics {
    #[inline]
    fn record_hit(&self, _key: &str) {}

    #[inline]
    fn record_miss(&self, _key: &str) {}

    #[inline]
    fn record_coalesced(&self, _key: &str) {}

    #[inline]
    fn record_recompute(&self, _key: &str, _duration: Duration, _ok: bool) {}

    #[inline]
    fn record_store_failure(&self, _operation: CacheOperation) {}

    #[inline]
    fn record_latency(&self, _operation: CacheOperation, _duration: Duration) {}
}

/// Metrics adapter using the `metrics` crate
///
/// # Example
/// ```ignore
/// use dashcache_core::MetricsCrateAdapter;
///
/// let metrics = MetricsCrateAdapter::new("dashcache");
/// // Emits: dashcache_hits_total, dashcache_recomputes_total, etc.
/// ```
#[cfg(feature = "metrics")]
#[derive(Debug, Clone)]
pub struct MetricsCrateAdapter {
    prefix: String,
}

#[cfg(feature = "metrics")]
impl MetricsCrateAdapter {
    /// Create a new adapter with the given metric name prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn metric_name(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }
}

#[cfg(feature = "metrics")]
impl CacheMetrics for MetricsCrateAdapter {
    fn record_hit(&self, key: &str) {
        metrics::counter!(self.metric_name("hits_total"), "key" => key.to_string()).increment(1);
    }

    fn record_miss(&self, key: &str) {
        metrics::counter!(self.metric_name("misses_total"), "key" => key.to_string()).increment(1);
    }

    fn record_coalesced(&self, key: &str) {
        metrics::counter!(self.metric_name("coalesced_total"), "key" => key.to_string())
            .increment(1);
    }

    fn record_recompute(&self, key: &str, duration: Duration, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        metrics::counter!(
            self.metric_name("recomputes_total"),
            "key" => key.to_string(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!(
            self.metric_name("recompute_duration_seconds"),
            "key" => key.to_string()
        )
        .record(duration.as_secs_f64());
    }

    fn record_store_failure(&self, operation: CacheOperation) {
        metrics::counter!(
            self.metric_name("store_failures_total"),
            "operation" => operation.as_str()
        )
        .increment(1);
    }

    fn record_latency(&self, operation: CacheOperation, duration: Duration) {
        metrics::histogram!(
            self.metric_name("operation_duration_seconds"),
            "operation" => operation.as_str()
        )
        .record(duration.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_as_str() {
        assert_eq!(CacheOperation::Get.as_str(), "get");
        assert_eq!(CacheOperation::Set.as_str(), "set");
        assert_eq!(CacheOperation::Delete.as_str(), "delete");
    }

    #[test]
    fn test_noop_metrics() {
        let metrics = NoopMetrics;
        metrics.record_hit("key");
        metrics.record_miss("key");
        metrics.record_coalesced("key");
        metrics.record_recompute("key", Duration::from_millis(3), false);
        metrics.record_store_failure(CacheOperation::Delete);
        metrics.record_latency(CacheOperation::Get, Duration::from_millis(1));
    }
}
