//! Wiring a dashboard service with structured logging
//!
//! Run with `RUST_LOG=dashcache=debug cargo run --example dashboard_overview`.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use dashcache::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// In-memory shop standing in for the transactional database
#[derive(Default)]
struct Shop {
    queries: AtomicUsize,
}

#[async_trait]
impl AggregationRepository for Shop {
    async fn fetch_product_totals(&self) -> Result<ProductTotalsRow> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(ProductTotalsRow {
            total_products: 3,
            total_stock: 130,
            avg_price: "24.99".parse::<FixedDecimal>().map_err(ReportError::repository)?,
        })
    }

    async fn fetch_recent_products(&self, limit: u32) -> Result<Vec<ProductRow>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let catalogue = [("Desk lamp", 1999, 40), ("Notebook", 499, 80), ("Chair", 4999, 10)];
        Ok(catalogue
            .iter()
            .enumerate()
            .take(limit as usize)
            .map(|(i, (name, cents, stock))| ProductRow {
                id: format!("prod-{}", i + 1),
                name: name.to_string(),
                price: FixedDecimal::new(*cents, 2),
                stock_quantity: *stock,
                created_at: Utc::now() - TimeDelta::days(i as i64),
            })
            .collect())
    }

    async fn fetch_top_customers(&self, limit: u32) -> Result<Vec<CustomerRow>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let customers = [("Ada", 152_300, 14), ("Grace", 98_050, 9), ("Linus", 12_000, 2)];
        Ok(customers
            .iter()
            .enumerate()
            .take(limit as usize)
            .map(|(i, (name, cents, orders))| CustomerRow {
                id: format!("cust-{}", i + 1),
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                total_spent: FixedDecimal::new(*cents, 2),
                total_orders: *orders,
            })
            .collect())
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dashcache=debug")),
        )
        .init();

    let shop = Arc::new(Shop::default());
    let dashboard = DashboardService::from_shared(
        shop.clone(),
        Arc::new(MemoryStore::with_defaults()),
        JsonSerializer,
        TracingMetrics::new().with_service_name("dashboard-example"),
        DashboardConfig::with_ttl(Duration::from_secs(60)).request_timeout(Duration::from_secs(2)),
    );

    println!("Ten concurrent requests on a cold cache...");
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let dashboard = dashboard.clone();
            tokio::spawn(async move { dashboard.get_complete_dashboard(2).await })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }
    println!("   queries issued: {}", shop.queries.load(Ordering::SeqCst));

    let overview = dashboard.get_complete_dashboard(2).await?;
    println!("\nServed from cache at {:?}", overview.product_report.served_from_cache);
    println!("{}", serde_json::to_string_pretty(&overview)?);

    println!("\nA product was updated; evicting the product report...");
    dashboard.notify(WriteEvent::ProductUpdated).await;
    let fresh = dashboard.get_product_dashboard().await?;
    println!("   from cache: {}", fresh.is_from_cache());
    println!("   queries issued: {}", shop.queries.load(Ordering::SeqCst));

    Ok(())
}
