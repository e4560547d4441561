//! # Order Repository
//!
//! Database operations for orders and their lines.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE (PENDING, zero totals) + invoice                            │
//! │     └── insert() + insert_line()*                                      │
//! │                                                                         │
//! │  2. EDIT LINES (PENDING only)                                          │
//! │     └── insert_line() / update_line() / delete_line()                  │
//! │     └── update_header() ← recomputed totals                            │
//! │                                                                         │
//! │  3. STATUS                                                             │
//! │     └── update_header() ← PAID → DELIVERED, or CANCELLED               │
//! │                                                                         │
//! │  Every step runs inside the caller's transaction, so the free          │
//! │  functions below take any SqliteExecutor (`&mut *tx`).                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use facture_core::{Order, OrderDetails, OrderLine, OrderStatus};

/// Optional criteria for [`OrderRepository::list`]. Empty matches everything.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub client_id: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_before: Option<DateTime<Utc>>,
}

// =============================================================================
// Transaction-Level Operations
// =============================================================================

/// Loads an order header.
pub async fn find_by_id<'e>(ex: impl SqliteExecutor<'e>, id: &str) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(ex)
        .await?;
    Ok(order)
}

/// Loads the lines of an order in position order.
pub async fn lines_for<'e>(ex: impl SqliteExecutor<'e>, order_id: &str) -> DbResult<Vec<OrderLine>> {
    let lines = sqlx::query_as::<_, OrderLine>(
        "SELECT * FROM order_lines WHERE order_id = ?1 ORDER BY position",
    )
    .bind(order_id)
    .fetch_all(ex)
    .await?;
    Ok(lines)
}

/// Number of the most recently created order, used to continue the daily
/// sequence.
pub async fn last_order_number<'e>(ex: impl SqliteExecutor<'e>) -> DbResult<Option<String>> {
    let number: Option<String> = sqlx::query_scalar(
        "SELECT order_number FROM orders ORDER BY created_at DESC, rowid DESC LIMIT 1",
    )
    .fetch_optional(ex)
    .await?;
    Ok(number)
}

/// Inserts an order header.
pub async fn insert<'e>(ex: impl SqliteExecutor<'e>, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, order_number = %order.order_number, "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, client_id, status, tax_rate_bps,
            subtotal_cents, tax_cents, total_cents, comment,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.client_id)
    .bind(order.status)
    .bind(order.tax_rate_bps)
    .bind(order.subtotal_cents)
    .bind(order.tax_cents)
    .bind(order.total_cents)
    .bind(&order.comment)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(ex)
    .await?;

    Ok(())
}

/// Writes status, tax rate, totals and comment back.
pub async fn update_header<'e>(ex: impl SqliteExecutor<'e>, order: &Order) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            status = ?2,
            tax_rate_bps = ?3,
            subtotal_cents = ?4,
            tax_cents = ?5,
            total_cents = ?6,
            comment = ?7,
            updated_at = ?8
        WHERE id = ?1
        "#,
    )
    .bind(&order.id)
    .bind(order.status)
    .bind(order.tax_rate_bps)
    .bind(order.subtotal_cents)
    .bind(order.tax_cents)
    .bind(order.total_cents)
    .bind(&order.comment)
    .bind(order.updated_at)
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order", &order.id));
    }

    Ok(())
}

/// Inserts a line item.
pub async fn insert_line<'e>(ex: impl SqliteExecutor<'e>, line: &OrderLine) -> DbResult<()> {
    debug!(order_id = %line.order_id, product_id = %line.product_id, "Adding order line");

    sqlx::query(
        r#"
        INSERT INTO order_lines (
            id, order_id, product_id, position, product_name,
            unit_price_cents, quantity, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&line.id)
    .bind(&line.order_id)
    .bind(&line.product_id)
    .bind(line.position)
    .bind(&line.product_name)
    .bind(line.unit_price_cents)
    .bind(line.quantity)
    .bind(line.subtotal_cents)
    .bind(line.created_at)
    .execute(ex)
    .await?;

    Ok(())
}

/// Writes quantity and subtotal of a line back.
pub async fn update_line<'e>(ex: impl SqliteExecutor<'e>, line: &OrderLine) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE order_lines SET quantity = ?2, subtotal_cents = ?3 WHERE id = ?1",
    )
    .bind(&line.id)
    .bind(line.quantity)
    .bind(line.subtotal_cents)
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order line", &line.id));
    }

    Ok(())
}

/// Deletes a line item.
pub async fn delete_line<'e>(ex: impl SqliteExecutor<'e>, line_id: &str) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM order_lines WHERE id = ?1")
        .bind(line_id)
        .execute(ex)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order line", line_id));
    }

    Ok(())
}

// =============================================================================
// Order Repository
// =============================================================================

/// Read access to orders outside of a transaction.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        find_by_id(&self.pool, id).await
    }

    /// Gets an order by its `CMD-` number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_number = ?1")
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    /// Gets an order together with its lines.
    pub async fn get_details(&self, id: &str) -> DbResult<Option<OrderDetails>> {
        let Some(order) = find_by_id(&self.pool, id).await? else {
            return Ok(None);
        };
        let lines = lines_for(&self.pool, id).await?;
        Ok(Some(OrderDetails { order, lines }))
    }

    /// Lines of an order in position order.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        lines_for(&self.pool, order_id).await
    }

    /// Orders matching `filter`, newest first.
    pub async fn list(&self, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM orders WHERE 1 = 1");

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(client_id) = &filter.client_id {
            query.push(" AND client_id = ").push_bind(client_id.clone());
        }
        if let Some(from) = filter.created_from {
            query.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(before) = filter.created_before {
            query.push(" AND created_at < ").push_bind(before);
        }
        query.push(" ORDER BY created_at DESC, rowid DESC");

        let orders = query.build_query_as::<Order>().fetch_all(&self.pool).await?;
        Ok(orders)
    }

    /// Σ TTC of PAID orders.
    pub async fn paid_revenue(&self) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_cents), 0) FROM orders WHERE status = ?1",
        )
        .bind(OrderStatus::Paid)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// Counts all orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
