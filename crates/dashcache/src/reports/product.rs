use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashcache_core::{CacheMetrics, CacheResult, CacheStore, JsonSerializer, NoopMetrics, Serializer};
use tracing::debug;

use crate::cache::ReportCache;
use crate::coalescer::{Coalescer, Role};
use crate::config::DashboardConfig;
use crate::error::{ReportError, Result};
use crate::join::JoinGroup;
use crate::keys::{Generation, ReportKey};
use crate::model::{ProductReport, ProductReportSnapshot};
use crate::repository::{AggregationRepository, ProductTotalsRow};

use super::write_back;

/// Read-through cache unit for the product report
pub struct ProductReportUnit<R, S, Z = JsonSerializer, M = NoopMetrics>
where
    R: AggregationRepository,
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    repo: Arc<R>,
    cache: ReportCache<S, Z, M>,
    coalescer: Coalescer<ProductReport>,
    generation: Generation,
    key: String,
    ttl: Duration,
    recent_limit: u32,
}

impl<R, S, Z, M> ProductReportUnit<R, S, Z, M>
where
    R: AggregationRepository,
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    /// Create a unit; `generation` is shared with whoever evicts the report
    pub fn new(
        repo: Arc<R>,
        cache: ReportCache<S, Z, M>,
        generation: Generation,
        config: &DashboardConfig,
    ) -> Self {
        let key = cache.full_key(&ReportKey::ProductReport);
        Self {
            repo,
            cache,
            coalescer: Coalescer::new(),
            generation,
            key,
            ttl: config.product_report_ttl,
            recent_limit: config.recent_products_limit,
        }
    }

    /// Full cache key of the report
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serve the report from cache, or recompute it once for all concurrent callers
    pub async fn get(&self) -> Result<ProductReportSnapshot> {
        let seen = self.generation.current();
        if let CacheResult::Hit(entry) = self.cache.probe::<ProductReport>(&self.key).await {
            return Ok(ProductReportSnapshot::cached(entry.value, Utc::now()));
        }

        let repo = self.repo.clone();
        let cache = self.cache.clone();
        let generation = self.generation.clone();
        let key = self.key.clone();
        let ttl = self.ttl;
        let recent_limit = self.recent_limit;

        let (result, role) = self
            .coalescer
            .execute_with_role(&Generation::group_key(&self.key, seen), move || async move {
                debug!(target: "dashcache", key = %key, "recomputing product report");
                let started = Instant::now();
                let computed = compute_product_report(repo.as_ref(), recent_limit).await;
                cache
                    .metrics()
                    .record_recompute(&key, started.elapsed(), computed.is_ok());

                let report = computed?;
                write_back(&cache, &generation, seen, &key, &report, ttl).await;
                Ok(report)
            })
            .await;

        if role == Role::Follower {
            self.cache.metrics().record_coalesced(&self.key);
        }
        result.map(ProductReportSnapshot::fresh)
    }
}

/// Query totals and recent products concurrently and build the report
///
/// Fails as soon as either query fails.
pub async fn compute_product_report<R>(repo: &R, recent_limit: u32) -> Result<ProductReport>
where
    R: AggregationRepository + ?Sized,
{
    let mut totals = ProductTotalsRow::default();
    let mut recent = Vec::new();

    let mut group = JoinGroup::new();
    group.push(async {
        totals = repo.fetch_product_totals().await?;
        Ok::<(), ReportError>(())
    });
    group.push(async {
        recent = repo.fetch_recent_products(recent_limit).await?;
        Ok(())
    });
    group.wait().await?;

    Ok(ProductReport::from_rows(totals, recent))
}
