//! Independently cached sub-reports

mod customers;
mod product;

pub use customers::TopCustomersUnit;
pub use product::{ProductReportUnit, compute_product_report};

use std::time::Duration;

use dashcache_core::{CacheMetrics, CacheStore, Serializer};
use serde::Serialize;
use tracing::debug;

use crate::cache::ReportCache;
use crate::keys::Generation;

/// Cache a recomputed report unless the report was evicted since `seen`
///
/// An eviction landing between the check and the write is caught by the
/// second check, which takes the entry back out.
pub(crate) async fn write_back<T, S, Z, M>(
    cache: &ReportCache<S, Z, M>,
    generation: &Generation,
    seen: u64,
    key: &str,
    value: &T,
    ttl: Duration,
) -> bool
where
    T: Serialize,
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    if generation.current() != seen {
        debug!(target: "dashcache", key = %key, "report evicted during recompute, not cached");
        return false;
    }

    cache.put(key, value, ttl).await;

    if generation.current() != seen {
        debug!(target: "dashcache", key = %key, "report evicted while being cached, removing");
        cache.evict(key).await;
        return false;
    }
    true
}
