//! # Sales Repository
//!
//! Read-only aggregates over `order_lines`, grouped per product.
//!
//! ## Figures
//! ```text
//! order_lines ──GROUP BY product_id──► ProductSales
//!                                       ├── order_count   COUNT(DISTINCT order_id)
//!                                       ├── units_sold    SUM(quantity)
//!                                       └── revenue_cents SUM(subtotal_cents)   (HT)
//! ```
//! Best sellers and per-product figures count every order that still holds
//! the line. The revenue ranking only counts PAID orders.

use serde::Serialize;
use sqlx::SqlitePool;
use ts_rs::TS;

use crate::error::DbResult;
use facture_core::OrderStatus;

/// Sales figures for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSales {
    pub product_id: String,
    /// Current catalog name, not the snapshot kept on the lines.
    pub product_name: String,
    pub order_count: i64,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// Repository for sales statistics.
///
/// ## Usage
/// ```rust,ignore
/// let top = db.sales().best_sellers(10).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SalesRepository {
    pool: SqlitePool,
}

impl SalesRepository {
    /// Creates a new SalesRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SalesRepository { pool }
    }

    /// Products ranked by units sold, most first.
    pub async fn best_sellers(&self, limit: u32) -> DbResult<Vec<ProductSales>> {
        let rows = sqlx::query_as::<_, ProductSales>(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                COUNT(DISTINCT l.order_id) AS order_count,
                SUM(l.quantity) AS units_sold,
                SUM(l.subtotal_cents) AS revenue_cents
            FROM order_lines l
            JOIN products p ON p.id = l.product_id
            GROUP BY p.id, p.name
            ORDER BY units_sold DESC, p.name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Products ranked by HT revenue on PAID orders, highest first.
    pub async fn top_revenue(&self, limit: u32) -> DbResult<Vec<ProductSales>> {
        let rows = sqlx::query_as::<_, ProductSales>(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                COUNT(DISTINCT l.order_id) AS order_count,
                SUM(l.quantity) AS units_sold,
                SUM(l.subtotal_cents) AS revenue_cents
            FROM order_lines l
            JOIN orders o ON o.id = l.order_id
            JOIN products p ON p.id = l.product_id
            WHERE o.status = ?1
            GROUP BY p.id, p.name
            ORDER BY revenue_cents DESC, p.name
            LIMIT ?2
            "#,
        )
        .bind(OrderStatus::Paid)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Figures for one product. Zeros when it was never ordered; `None`
    /// when the product does not exist.
    pub async fn for_product(&self, product_id: &str) -> DbResult<Option<ProductSales>> {
        let row = sqlx::query_as::<_, ProductSales>(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                COUNT(DISTINCT l.order_id) AS order_count,
                COALESCE(SUM(l.quantity), 0) AS units_sold,
                COALESCE(SUM(l.subtotal_cents), 0) AS revenue_cents
            FROM products p
            LEFT JOIN order_lines l ON l.product_id = p.id
            WHERE p.id = ?1
            GROUP BY p.id, p.name
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
