//! Report engine configuration

use std::time::Duration;

/// How the top-customers report is keyed in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopCustomersKeyPolicy {
    /// One key for every limit. The cached list keeps the length requested by
    /// whichever call recomputed it, until the entry expires or is evicted.
    #[default]
    Shared,
    /// One key per requested limit (`dashboard:customer:top:<limit>`)
    PerLimit,
}

/// Configuration for the dashboard report engine
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// TTL of the cached product report
    pub product_report_ttl: Duration,
    /// TTL of the cached top-customers report
    pub top_customers_ttl: Duration,
    /// Number of most recently created products in the product report
    pub recent_products_limit: u32,
    /// Limit used when a caller asks for zero top customers
    pub default_top_customers_limit: u32,
    /// Cache keying of the top-customers report
    pub top_customers_key_policy: TopCustomersKeyPolicy,
    /// Evict the top-customers report when an order is created
    pub invalidate_top_customers_on_order: bool,
    /// Deadline applied to every inbound report operation
    pub request_timeout: Option<Duration>,
    /// Namespace prefix for all keys
    pub namespace: Option<String>,
    /// Extra random TTL as a fraction of the TTL (0.0 - 1.0)
    pub ttl_jitter: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            product_report_ttl: Duration::from_secs(300),
            top_customers_ttl: Duration::from_secs(300),
            recent_products_limit: 5,
            default_top_customers_limit: 10,
            top_customers_key_policy: TopCustomersKeyPolicy::Shared,
            invalidate_top_customers_on_order: false,
            request_timeout: None,
            namespace: None,
            ttl_jitter: 0.0,
        }
    }
}

impl DashboardConfig {
    /// Create config with the same TTL for both reports
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            product_report_ttl: ttl,
            top_customers_ttl: ttl,
            ..Default::default()
        }
    }

    /// Create config with namespace
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    /// Key the top-customers report by limit
    pub fn per_limit_keys(mut self) -> Self {
        self.top_customers_key_policy = TopCustomersKeyPolicy::PerLimit;
        self
    }

    /// Evict the top-customers report on order creation
    pub fn invalidate_on_orders(mut self) -> Self {
        self.invalidate_top_customers_on_order = true;
        self
    }

    /// Bound every report operation by `timeout`
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the number of recent products in the product report
    pub fn recent_products(mut self, limit: u32) -> Self {
        self.recent_products_limit = limit;
        self
    }

    /// Set TTL jitter, clamped to 0.0 - 1.0
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = jitter.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_policy() {
        let config = DashboardConfig::default();
        assert_eq!(config.product_report_ttl, Duration::from_secs(300));
        assert_eq!(config.top_customers_ttl, Duration::from_secs(300));
        assert_eq!(config.recent_products_limit, 5);
        assert_eq!(config.top_customers_key_policy, TopCustomersKeyPolicy::Shared);
        assert!(!config.invalidate_top_customers_on_order);
        assert_eq!(config.default_top_customers_limit, 10);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_builder_fluent() {
        let config = DashboardConfig::with_namespace("shop")
            .per_limit_keys()
            .invalidate_on_orders()
            .request_timeout(Duration::from_secs(2))
            .ttl_jitter(3.0);

        assert_eq!(config.namespace.as_deref(), Some("shop"));
        assert_eq!(config.top_customers_key_policy, TopCustomersKeyPolicy::PerLimit);
        assert!(config.invalidate_top_customers_on_order);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.ttl_jitter, 1.0);
    }
}
