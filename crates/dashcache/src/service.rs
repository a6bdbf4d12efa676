//! Dashboard report service

use std::sync::Arc;

use dashcache_core::{CacheMetrics, CacheStore, JsonSerializer, NoopMetrics, Serializer};

use crate::cache::ReportCache;
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::invalidation::{ReportInvalidator, WriteEvent};
use crate::join::{try_join2, with_deadline};
use crate::keys::KeyRegistry;
use crate::model::{DashboardOverview, ProductReportSnapshot, TopCustomer};
use crate::reports::{ProductReportUnit, TopCustomersUnit};
use crate::repository::AggregationRepository;

/// Entry point of the report engine
///
/// Serves the product report, the top-customers report and the combined
/// overview through a read-through cache with one recomputation per report
/// key at a time. Cloning is cheap and clones share cache, coalescers and
/// repository.
pub struct DashboardService<R, S, Z = JsonSerializer, M = NoopMetrics>
where
    R: AggregationRepository,
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    product: Arc<ProductReportUnit<R, S, Z, M>>,
    customers: Arc<TopCustomersUnit<R, S, Z, M>>,
    invalidator: ReportInvalidator<S, Z, M>,
    cache: ReportCache<S, Z, M>,
    config: Arc<DashboardConfig>,
}

// Constructors for default serializer/metrics
impl<R, S> DashboardService<R, S, JsonSerializer, NoopMetrics>
where
    R: AggregationRepository,
    S: CacheStore,
{
    /// Create with the default configuration, JSON payloads and no metrics
    pub fn new(repo: R, store: S) -> Self {
        Self::with_config(repo, store, DashboardConfig::default())
    }

    /// Create with custom config
    pub fn with_config(repo: R, store: S, config: DashboardConfig) -> Self {
        Self::with_serializer_and_metrics(repo, store, JsonSerializer, NoopMetrics, config)
    }
}

impl<R, S, Z, M> DashboardService<R, S, Z, M>
where
    R: AggregationRepository,
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    /// Create with custom serializer and metrics
    pub fn with_serializer_and_metrics(
        repo: R,
        store: S,
        serializer: Z,
        metrics: M,
        config: DashboardConfig,
    ) -> Self {
        Self::from_shared(Arc::new(repo), Arc::new(store), serializer, metrics, config)
    }

    /// Create over a repository and store that are shared with other components
    pub fn from_shared(
        repo: Arc<R>,
        store: Arc<S>,
        serializer: Z,
        metrics: M,
        config: DashboardConfig,
    ) -> Self {
        let cache = ReportCache::with_parts(
            store,
            serializer,
            metrics,
            config.namespace.clone(),
            config.ttl_jitter,
        );
        let populated = KeyRegistry::new();
        let invalidator = ReportInvalidator::new(cache.clone(), populated.clone(), &config);

        Self {
            product: Arc::new(ProductReportUnit::new(
                repo.clone(),
                cache.clone(),
                invalidator.product_generation(),
                &config,
            )),
            customers: Arc::new(TopCustomersUnit::new(
                repo,
                cache.clone(),
                invalidator.top_customers_generation(),
                populated,
                &config,
            )),
            invalidator,
            cache,
            config: Arc::new(config),
        }
    }

    /// Product totals and recent products, stamped when served from cache
    pub async fn get_product_dashboard(&self) -> Result<ProductReportSnapshot> {
        with_deadline(self.config.request_timeout, self.product.get()).await
    }

    /// Customers ranked by total spend; a limit of zero means the configured default
    pub async fn get_top_customers(&self, limit: u32) -> Result<Vec<TopCustomer>> {
        with_deadline(self.config.request_timeout, self.customers.get(limit)).await
    }

    /// Both reports fetched concurrently; fails as soon as either fails
    ///
    /// The overview itself is never cached, but each part goes through its
    /// own cache entry and coalescer.
    pub async fn get_complete_dashboard(&self, limit: u32) -> Result<DashboardOverview> {
        let (product_report, top_customers) = with_deadline(
            self.config.request_timeout,
            try_join2(self.product.get(), self.customers.get(limit)),
        )
        .await?;

        Ok(DashboardOverview {
            product_report,
            top_customers,
        })
    }

    /// Invalidate the reports affected by a committed write
    pub async fn notify(&self, event: WriteEvent) {
        self.invalidator.notify(event).await;
    }

    /// Handle for write-side components
    pub fn invalidator(&self) -> ReportInvalidator<S, Z, M> {
        self.invalidator.clone()
    }

    /// Full cache key of the product report
    pub fn product_report_key(&self) -> &str {
        self.product.key()
    }

    /// Full cache key used for the top customers at `limit`
    pub fn top_customers_key(&self, limit: u32) -> String {
        self.customers.key_for(limit)
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        self.cache.store()
    }

    /// The metrics sink
    pub fn metrics(&self) -> &M {
        self.cache.metrics()
    }
}

impl<R, S, Z, M> Clone for DashboardService<R, S, Z, M>
where
    R: AggregationRepository,
    S: CacheStore,
    Z: Serializer,
    M: CacheMetrics,
{
    fn clone(&self) -> Self {
        Self {
            product: self.product.clone(),
            customers: self.customers.clone(),
            invalidator: self.invalidator.clone(),
            cache: self.cache.clone(),
            config: self.config.clone(),
        }
    }
}
