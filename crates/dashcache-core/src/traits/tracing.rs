use crate::{CacheMetrics, CacheOperation};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Metrics adapter that logs events via `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingMetrics {
    /// Service name/prefix (optional)
    service_name: Option<String>,
}

impl TracingMetrics {
    /// Create new tracing metrics adapter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with service name prefix
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }
}

impl CacheMetrics for TracingMetrics {
    fn record_hit(&self, key: &str) {
        debug!(
            target: "dashcache",
            event = "hit",
            key = %key,
            service = ?self.service_name,
            "Report cache hit"
        );
    }

    fn record_miss(&self, key: &str) {
        debug!(
            target: "dashcache",
            event = "miss",
            key = %key,
            service = ?self.service_name,
            "Report cache miss"
        );
    }

    fn record_coalesced(&self, key: &str) {
        debug!(
            target: "dashcache",
            event = "coalesced",
            key = %key,
            service = ?self.service_name,
            "Joined in-flight recomputation"
        );
    }

    fn record_recompute(&self, key: &str, duration: Duration, ok: bool) {
        debug!(
            target: "dashcache",
            event = "recompute",
            key = %key,
            ok = ok,
            duration_ms = duration.as_millis(),
            service = ?self.service_name,
            "Report recomputed"
        );
    }

    fn record_store_failure(&self, operation: CacheOperation) {
        warn!(
            target: "dashcache",
            event = "store_failure",
            operation = operation.as_str(),
            service = ?self.service_name,
            "Cache store operation failed"
        );
    }

    fn record_latency(&self, operation: CacheOperation, duration: Duration) {
        trace!(
            target: "dashcache",
            event = "latency",
            operation = ?operation,
            duration_ms = duration.as_millis(),
            service = ?self.service_name,
            "Cache operation latency"
        );
    }
}
