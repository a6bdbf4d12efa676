//! Write-then-evict invalidation of cached reports

use dashcache_core::{CacheMetrics, CacheStore, JsonSerializer, NoopMetrics, Serializer};
use tracing::debug;

use crate::cache::ReportCache;
use crate::config::DashboardConfig;
use crate::keys::{Generation, KeyRegistry, ReportKey};

/// A committed write elsewhere in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEvent {
    ProductCreated,
    ProductUpdated,
    OrderCreated,
}

/// Evicts cached reports after writes
///
/// Call it only after the write has committed. Eviction is best effort:
/// failures are logged and never reach the write side, and the entry then
/// lives until its TTL.
///
/// Each eviction also bumps the report's [`Generation`], so a recompute that
/// was already running does not write its now outdated result back.
pub struct ReportInvalidator<S, Z = JsonSerializer, M = NoopMetrics>
where
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    cache: ReportCache<S, Z, M>,
    product_key: String,
    top_customers_key: String,
    product_generation: Generation,
    top_customers_generation: Generation,
    populated: KeyRegistry,
    evict_on_order: bool,
}

impl<S, Z, M> ReportInvalidator<S, Z, M>
where
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    pub fn new(cache: ReportCache<S, Z, M>, populated: KeyRegistry, config: &DashboardConfig) -> Self {
        let product_key = cache.full_key(&ReportKey::ProductReport);
        let top_customers_key = cache.full_key(&ReportKey::TopCustomers { limit: None });
        Self {
            cache,
            product_key,
            top_customers_key,
            product_generation: Generation::new(),
            top_customers_generation: Generation::new(),
            populated,
            evict_on_order: config.invalidate_top_customers_on_order,
        }
    }

    /// Generation bumped by every product report eviction
    pub fn product_generation(&self) -> Generation {
        self.product_generation.clone()
    }

    /// Generation bumped by every top-customers eviction
    pub fn top_customers_generation(&self) -> Generation {
        self.top_customers_generation.clone()
    }

    /// Evict the product report, returning the number of keys removed
    pub async fn invalidate_product_report(&self) -> u64 {
        self.product_generation.bump();
        let removed = self.cache.evict(&self.product_key).await;
        debug!(target: "dashcache", key = %self.product_key, removed, "product report invalidated");
        removed
    }

    /// Evict the shared top-customers key and every per-limit key populated so far
    pub async fn invalidate_top_customers(&self) -> u64 {
        self.top_customers_generation.bump();
        let mut removed = self.cache.evict(&self.top_customers_key).await;
        for key in self.populated.drain() {
            removed += self.cache.evict(&key).await;
        }
        debug!(target: "dashcache", removed, "top customers invalidated");
        removed
    }

    /// React to a committed write
    pub async fn notify(&self, event: WriteEvent) {
        match event {
            WriteEvent::ProductCreated | WriteEvent::ProductUpdated => {
                self.invalidate_product_report().await;
            }
            WriteEvent::OrderCreated if self.evict_on_order => {
                self.invalidate_top_customers().await;
            }
            WriteEvent::OrderCreated => {}
        }
    }
}

impl<S, Z, M> Clone for ReportInvalidator<S, Z, M>
where
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            product_key: self.product_key.clone(),
            top_customers_key: self.top_customers_key.clone(),
            product_generation: self.product_generation.clone(),
            top_customers_generation: self.top_customers_generation.clone(),
            populated: self.populated.clone(),
            evict_on_order: self.evict_on_order,
        }
    }
}
