//! # Product Repository
//!
//! Database operations for catalog products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Name search, category and price filters
//! - Stock levels and availability
//!
//! ## Stock Alerts
//! ```text
//! stock_quantity
//!      0            ── out of stock
//!      1 ..= threshold ── low stock
//!      > threshold  ── fine
//! ```
//! Stock is informational; orders never move it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;
use ts_rs::TS;

use super::contains_pattern;
use crate::error::{DbError, DbResult};
use facture_core::Product;

/// Catalog figures shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductStats {
    pub total_products: i64,
    pub available_products: i64,
    /// Mean price rounded to the cent; 0 when the catalog is empty.
    pub average_price_cents: i64,
    /// Σ price × stock.
    pub stock_value_cents: i64,
}

/// Looks up a product on any executor (pool or open transaction).
pub async fn find_by_id<'e>(ex: impl SqliteExecutor<'e>, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(ex)
        .await?;
    Ok(product)
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let results = repo.search("chair").await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its UUID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        find_by_id(&self.pool, id).await
    }

    /// All products, alphabetically.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Products that can be ordered.
    pub async fn list_available(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_available = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Case-insensitive substring search on the product name.
    ///
    /// An empty query returns every product.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Product>> {
        debug!(query = %query, "Searching products");

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE name LIKE ?1 ESCAPE '\'
            ORDER BY name
            "#,
        )
        .bind(contains_pattern(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products filed under a category.
    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE category_id = ?1 ORDER BY name",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Orderable products of one category.
    pub async fn list_available_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE category_id = ?1 AND is_available = 1 ORDER BY name",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Products created at or after `since`, newest first.
    pub async fn list_created_since(&self, since: DateTime<Utc>) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE created_at >= ?1 ORDER BY created_at DESC, name",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Products priced within `[min, max]` (either bound optional), cheapest first.
    pub async fn list_by_price_range(
        &self,
        min_cents: Option<i64>,
        max_cents: Option<i64>,
    ) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE (?1 IS NULL OR price_cents >= ?1)
              AND (?2 IS NULL OR price_cents <= ?2)
            ORDER BY price_cents, name
            "#,
        )
        .bind(min_cents)
        .bind(max_cents)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// In stock but at or below the alert threshold.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE stock_quantity > 0 AND stock_quantity <= low_stock_threshold
            ORDER BY stock_quantity, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Stock at zero.
    pub async fn list_out_of_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE stock_quantity = 0 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// True if another product already uses `name` (case-insensitive).
    pub async fn name_exists(&self, name: &str, exclude_id: Option<&str>) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE name = ?1 COLLATE NOCASE AND id != COALESCE(?2, '')",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, category_id, name, description,
                price_cents, stock_quantity, low_stock_threshold, is_available,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.low_stock_threshold)
        .bind(product.is_available)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates every editable column of a product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                category_id = ?2,
                name = ?3,
                description = ?4,
                price_cents = ?5,
                stock_quantity = ?6,
                low_stock_threshold = ?7,
                is_available = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.low_stock_threshold)
        .bind(product.is_available)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Toggles whether the product can be ordered.
    pub async fn set_availability(&self, id: &str, available: bool, now: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET is_available = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(available)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Overwrites the stock level.
    pub async fn set_stock(&self, id: &str, quantity: i64, now: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET stock_quantity = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Adds `delta` to the stock level, refusing to go below zero.
    ///
    /// ## Returns
    /// * `Ok(true)` - stock updated
    /// * `Ok(false)` - product exists but the result would be negative
    /// * `Err(DbError::NotFound)` - unknown product
    pub async fn adjust_stock(&self, id: &str, delta: i64, now: DateTime<Utc>) -> DbResult<bool> {
        debug!(id = %id, delta = delta, "Adjusting stock");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock_quantity = stock_quantity + ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock_quantity + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        match self.get_by_id(id).await? {
            Some(_) => Ok(false),
            None => Err(DbError::not_found("Product", id)),
        }
    }

    /// Deletes a product. Callers check [`Self::count_order_lines`] first.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Number of order lines referencing the product.
    pub async fn count_order_lines(&self, id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_lines WHERE product_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Aggregates for the catalog dashboard.
    pub async fn stats(&self) -> DbResult<ProductStats> {
        let (total, available, average, stock_value): (i64, i64, Option<f64>, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(is_available), 0),
                AVG(price_cents),
                COALESCE(SUM(price_cents * stock_quantity), 0)
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ProductStats {
            total_products: total,
            available_products: available,
            average_price_cents: average.map(|avg| avg.round() as i64).unwrap_or(0),
            stock_value_cents: stock_value,
        })
    }
}
