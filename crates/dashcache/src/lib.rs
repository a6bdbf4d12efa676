//! dashcache: Stampede-protected read-through cache for dashboard reports
//!
//! # Features
//!
//! - **Read-through caching** of the product report and the top-customers report
//! - **Stampede protection**: one recomputation per report key at a time
//! - **Fail-fast fan-out** of independent aggregation queries
//! - **Write-then-evict invalidation** driven by write-side events
//! - **Pluggable stores and serialization** (memory, Redis, JSON, MessagePack)
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dashcache::prelude::*;
//!
//! struct Warehouse;
//!
//! #[async_trait::async_trait]
//! impl AggregationRepository for Warehouse {
//!     async fn fetch_product_totals(&self) -> Result<ProductTotalsRow> {
//!         Ok(ProductTotalsRow::default())
//!     }
//!
//!     async fn fetch_recent_products(&self, _limit: u32) -> Result<Vec<ProductRow>> {
//!         Ok(Vec::new())
//!     }
//!
//!     async fn fetch_top_customers(&self, _limit: u32) -> Result<Vec<CustomerRow>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let dashboard = DashboardService::new(Warehouse, MemoryStore::with_defaults());
//!
//!     let overview = dashboard.get_complete_dashboard(10).await?;
//!     println!("{} products", overview.product_report.report.total_products);
//!
//!     // After a product write has committed
//!     dashboard.notify(WriteEvent::ProductUpdated).await;
//!     Ok(())
//! }
//! ```

mod cache;
mod coalescer;
mod config;
mod error;
mod invalidation;
mod join;
mod keys;
mod model;
mod reports;
mod repository;
mod service;

// Re-export core
pub use dashcache_core::{
    CacheEntry, CacheError, CacheKey, CacheMetrics, CacheOperation, CacheResult, CacheStats,
    CacheStore, JsonSerializer, NoopMetrics, Serializer,
};

#[cfg(feature = "msgpack")]
pub use dashcache_core::MsgPackSerializer;

#[cfg(feature = "metrics")]
pub use dashcache_core::MetricsCrateAdapter;

#[cfg(feature = "tracing")]
pub use dashcache_core::TracingMetrics;

// Re-export storage
#[cfg(feature = "memory")]
pub use dashcache_storage::{MemoryConfig, MemoryStore};

#[cfg(feature = "redis")]
pub use dashcache_storage::{RedisConfig, RedisStore};

pub use cache::ReportCache;
pub use coalescer::{Coalescer, Role};
pub use config::{DashboardConfig, TopCustomersKeyPolicy};
pub use error::{ReportError, Result};
pub use invalidation::{ReportInvalidator, WriteEvent};
pub use join::{JoinGroup, try_join2, with_deadline};
pub use keys::{
    Generation, KeyRegistry, MAX_TRACKED_KEYS, PRODUCT_REPORT_KEY, ReportKey, TOP_CUSTOMERS_KEY,
};
pub use model::{DashboardOverview, ProductReport, ProductReportSnapshot, RecentProduct, TopCustomer};
pub use reports::{ProductReportUnit, TopCustomersUnit, compute_product_report};
pub use repository::{
    AggregationRepository, CustomerRow, FixedDecimal, ParseDecimalError, ProductRow,
    ProductTotalsRow,
};
pub use service::DashboardService;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AggregationRepository, CacheStore, CustomerRow, DashboardConfig, DashboardOverview,
        DashboardService, FixedDecimal, JsonSerializer, ProductReportSnapshot, ProductRow,
        ProductTotalsRow, ReportError, Result, TopCustomer, TopCustomersKeyPolicy, WriteEvent,
    };

    #[cfg(feature = "memory")]
    pub use crate::{MemoryConfig, MemoryStore};

    #[cfg(feature = "redis")]
    pub use crate::{RedisConfig, RedisStore};

    #[cfg(feature = "msgpack")]
    pub use crate::MsgPackSerializer;

    #[cfg(feature = "tracing")]
    pub use crate::TracingMetrics;
}
