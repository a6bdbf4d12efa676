//! Report shapes returned to callers and stored in the cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repository::{CustomerRow, ProductRow, ProductTotalsRow};

/// A recently created product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentProduct {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ProductRow> for RecentProduct {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price.to_f64(),
            stock_quantity: row.stock_quantity,
            created_at: row.created_at,
        }
    }
}

/// Product totals plus the most recently created products
///
/// This is the cached payload of the product report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductReport {
    pub total_products: i64,
    pub total_stock: i64,
    pub average_price: f64,
    pub recent_products: Vec<RecentProduct>,
}

impl ProductReport {
    /// Map repository rows, keeping the order of `recent`
    pub fn from_rows(totals: ProductTotalsRow, recent: Vec<ProductRow>) -> Self {
        Self {
            total_products: totals.total_products,
            total_stock: totals.total_stock,
            average_price: totals.avg_price.to_f64(),
            recent_products: recent.into_iter().map(RecentProduct::from).collect(),
        }
    }
}

/// Product report as handed to the presentation layer
///
/// `served_from_cache` is set to the time of the read only when the report
/// came from the cache; it is never part of the cached payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductReportSnapshot {
    #[serde(flatten)]
    pub report: ProductReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub served_from_cache: Option<DateTime<Utc>>,
}

impl ProductReportSnapshot {
    /// A freshly computed report
    pub fn fresh(report: ProductReport) -> Self {
        Self {
            report,
            served_from_cache: None,
        }
    }

    /// A report read from the cache at `at`
    pub fn cached(report: ProductReport, at: DateTime<Utc>) -> Self {
        Self {
            report,
            served_from_cache: Some(at),
        }
    }

    pub fn is_from_cache(&self) -> bool {
        self.served_from_cache.is_some()
    }
}

/// A customer ranked by total spend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCustomer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub total_spent: f64,
    pub total_orders: i64,
}

impl From<CustomerRow> for TopCustomer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            total_spent: row.total_spent.to_f64(),
            total_orders: row.total_orders,
        }
    }
}

/// Product report and top customers assembled per request; never cached
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub product_report: ProductReportSnapshot,
    pub top_customers: Vec<TopCustomer>,
}
