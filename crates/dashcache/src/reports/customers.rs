use std::sync::Arc;
use std::time::{Duration, Instant};

use dashcache_core::{CacheMetrics, CacheResult, CacheStore, JsonSerializer, NoopMetrics, Serializer};
use tracing::debug;

use crate::cache::ReportCache;
use crate::coalescer::{Coalescer, Role};
use crate::config::{DashboardConfig, TopCustomersKeyPolicy};
use crate::error::Result;
use crate::keys::{Generation, KeyRegistry, ReportKey};
use crate::model::TopCustomer;
use crate::repository::AggregationRepository;

use super::write_back;

/// Read-through cache unit for the top-customers report
///
/// Unlike the product report, cached results are returned without a cache
/// stamp. With the default [`TopCustomersKeyPolicy::Shared`] policy the
/// cached list has the length requested by whichever call recomputed it.
pub struct TopCustomersUnit<R, S, Z = JsonSerializer, M = NoopMetrics>
where
    R: AggregationRepository,
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    repo: Arc<R>,
    cache: ReportCache<S, Z, M>,
    coalescer: Coalescer<Vec<TopCustomer>>,
    generation: Generation,
    populated: KeyRegistry,
    policy: TopCustomersKeyPolicy,
    ttl: Duration,
    default_limit: u32,
}

impl<R, S, Z, M> TopCustomersUnit<R, S, Z, M>
where
    R: AggregationRepository,
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    /// Create a unit; `generation` and `populated` are shared with whoever
    /// evicts the report
    pub fn new(
        repo: Arc<R>,
        cache: ReportCache<S, Z, M>,
        generation: Generation,
        populated: KeyRegistry,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            repo,
            cache,
            coalescer: Coalescer::new(),
            generation,
            populated,
            policy: config.top_customers_key_policy,
            ttl: config.top_customers_ttl,
            default_limit: config.default_top_customers_limit,
        }
    }

    /// Full cache key used for `limit`
    pub fn key_for(&self, limit: u32) -> String {
        self.cache
            .full_key(&ReportKey::top_customers(self.policy, self.resolve_limit(limit)))
    }

    fn resolve_limit(&self, limit: u32) -> u32 {
        if limit == 0 { self.default_limit } else { limit }
    }

    /// Serve the ranking from cache, or recompute it once for all concurrent callers
    ///
    /// A limit of zero means the configured default. An empty ranking is a
    /// valid result and is cached like any other.
    pub async fn get(&self, limit: u32) -> Result<Vec<TopCustomer>> {
        let limit = self.resolve_limit(limit);
        let key = self.key_for(limit);
        let seen = self.generation.current();

        if let CacheResult::Hit(entry) = self.cache.probe::<Vec<TopCustomer>>(&key).await {
            return Ok(entry.value);
        }

        let repo = self.repo.clone();
        let cache = self.cache.clone();
        let generation = self.generation.clone();
        let populated = self.populated.clone();
        let track = self.policy == TopCustomersKeyPolicy::PerLimit;
        let ttl = self.ttl;
        let entry_key = key.clone();

        let (result, role) = self
            .coalescer
            .execute_with_role(&Generation::group_key(&key, seen), move || async move {
                debug!(target: "dashcache", key = %entry_key, limit, "recomputing top customers");
                let started = Instant::now();
                let rows = repo.fetch_top_customers(limit).await;
                cache
                    .metrics()
                    .record_recompute(&entry_key, started.elapsed(), rows.is_ok());

                let customers: Vec<TopCustomer> =
                    rows?.into_iter().map(TopCustomer::from).collect();
                // Recorded before the write so an eviction never misses it
                if track {
                    populated.record(&entry_key, cache.ttl_ceiling(ttl));
                }
                write_back(&cache, &generation, seen, &entry_key, &customers, ttl).await;
                Ok(customers)
            })
            .await;

        if role == Role::Follower {
            self.cache.metrics().record_coalesced(&key);
        }
        result
    }
}
