//! # Invoice Repository
//!
//! Database operations for invoices.
//!
//! Invoices are written only by the services, inside the transaction that
//! changed their order; the repository struct itself is read-only.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use tracing::debug;
use ts_rs::TS;

use crate::error::{DbError, DbResult};
use facture_core::{Invoice, InvoiceStatus};

/// Optional criteria for [`InvoiceRepository::filter`]. Any combination works.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub client_id: Option<String>,
    /// Inclusive lower bound on `invoice_date`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `invoice_date`.
    pub to: Option<DateTime<Utc>>,
}

/// Billing dashboard figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceStats {
    pub total_invoices: i64,
    pub pending_invoices: i64,
    pub paid_invoices: i64,
    pub cancelled_invoices: i64,
    /// Σ TTC of PAID invoices.
    pub revenue_cents: i64,
    /// Σ TTC of invoices paid during the current month.
    pub month_revenue_cents: i64,
}

// =============================================================================
// Transaction-Level Operations
// =============================================================================

/// Loads an invoice by ID.
pub async fn find_by_id<'e>(ex: impl SqliteExecutor<'e>, id: &str) -> DbResult<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = ?1")
        .bind(id)
        .fetch_optional(ex)
        .await?;
    Ok(invoice)
}

/// Loads the invoice of an order, if one was issued.
pub async fn find_by_order<'e>(ex: impl SqliteExecutor<'e>, order_id: &str) -> DbResult<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE order_id = ?1")
        .bind(order_id)
        .fetch_optional(ex)
        .await?;
    Ok(invoice)
}

/// Number of invoices ever issued; feeds the `FAC-` sequence.
pub async fn count<'e>(ex: impl SqliteExecutor<'e>) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
        .fetch_one(ex)
        .await?;
    Ok(count)
}

/// Inserts an invoice.
pub async fn insert<'e>(ex: impl SqliteExecutor<'e>, invoice: &Invoice) -> DbResult<()> {
    debug!(id = %invoice.id, invoice_number = %invoice.invoice_number, "Inserting invoice");

    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, invoice_number, order_id, client_name, status, payment_method,
            order_status, tax_rate_bps, subtotal_cents, tax_cents, total_cents,
            comment, invoice_date, paid_at, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15, ?16
        )
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.invoice_number)
    .bind(&invoice.order_id)
    .bind(&invoice.client_name)
    .bind(invoice.status)
    .bind(invoice.payment_method)
    .bind(invoice.order_status)
    .bind(invoice.tax_rate_bps)
    .bind(invoice.subtotal_cents)
    .bind(invoice.tax_cents)
    .bind(invoice.total_cents)
    .bind(&invoice.comment)
    .bind(invoice.invoice_date)
    .bind(invoice.paid_at)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(ex)
    .await?;

    Ok(())
}

/// Writes every mutable column back.
pub async fn update<'e>(ex: impl SqliteExecutor<'e>, invoice: &Invoice) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE invoices SET
            status = ?2,
            payment_method = ?3,
            order_status = ?4,
            tax_rate_bps = ?5,
            subtotal_cents = ?6,
            tax_cents = ?7,
            total_cents = ?8,
            comment = ?9,
            paid_at = ?10,
            updated_at = ?11
        WHERE id = ?1
        "#,
    )
    .bind(&invoice.id)
    .bind(invoice.status)
    .bind(invoice.payment_method)
    .bind(invoice.order_status)
    .bind(invoice.tax_rate_bps)
    .bind(invoice.subtotal_cents)
    .bind(invoice.tax_cents)
    .bind(invoice.total_cents)
    .bind(&invoice.comment)
    .bind(invoice.paid_at)
    .bind(invoice.updated_at)
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Invoice", &invoice.id));
    }

    Ok(())
}

// =============================================================================
// Invoice Repository
// =============================================================================

/// Read access to invoices.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        find_by_id(&self.pool, id).await
    }

    /// Gets an invoice by its `FAC-` number.
    pub async fn get_by_number(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE invoice_number = ?1")
            .bind(invoice_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invoice)
    }

    /// Gets the invoice issued for an order.
    pub async fn get_by_order(&self, order_id: &str) -> DbResult<Option<Invoice>> {
        find_by_order(&self.pool, order_id).await
    }

    /// Invoices matching `filter`, newest invoice date first.
    pub async fn filter(&self, filter: &InvoiceFilter) -> DbResult<Vec<Invoice>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT i.* FROM invoices i JOIN orders o ON o.id = i.order_id WHERE 1 = 1",
        );

        if let Some(status) = filter.status {
            query.push(" AND i.status = ").push_bind(status);
        }
        if let Some(client_id) = &filter.client_id {
            query.push(" AND o.client_id = ").push_bind(client_id.clone());
        }
        if let Some(from) = filter.from {
            query.push(" AND i.invoice_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND i.invoice_date <= ").push_bind(to);
        }
        query.push(" ORDER BY i.invoice_date DESC, i.rowid DESC");

        let invoices = query.build_query_as::<Invoice>().fetch_all(&self.pool).await?;
        Ok(invoices)
    }

    /// PENDING invoices, oldest first: the work queue.
    pub async fn list_unprocessed(&self) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE status = ?1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(InvoiceStatus::Pending)
        .fetch_all(&self.pool)
        .await?;
        Ok(invoices)
    }

    /// PAID invoices with `from <= paid_at < before`, latest payment first.
    pub async fn list_paid_between(
        &self,
        from: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT * FROM invoices
            WHERE status = ?1 AND paid_at >= ?2 AND paid_at < ?3
            ORDER BY paid_at DESC
            "#,
        )
        .bind(InvoiceStatus::Paid)
        .bind(from)
        .bind(before)
        .fetch_all(&self.pool)
        .await?;
        Ok(invoices)
    }

    /// Every invoice of a client, newest first.
    pub async fn list_by_client(&self, client_id: &str) -> DbResult<Vec<Invoice>> {
        self.filter(&InvoiceFilter {
            client_id: Some(client_id.to_string()),
            ..InvoiceFilter::default()
        })
        .await
    }

    /// Counts per status plus revenue; `month_from..month_before` bounds
    /// the monthly figure.
    pub async fn stats(
        &self,
        month_from: DateTime<Utc>,
        month_before: DateTime<Utc>,
    ) -> DbResult<InvoiceStats> {
        let (total, pending, paid, cancelled, revenue, month_revenue): (i64, i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(status = 'pending'), 0),
                    COALESCE(SUM(status = 'paid'), 0),
                    COALESCE(SUM(status = 'cancelled'), 0),
                    COALESCE(SUM(CASE WHEN status = 'paid' THEN total_cents ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'paid' AND paid_at >= ?1 AND paid_at < ?2
                                      THEN total_cents ELSE 0 END), 0)
                FROM invoices
                "#,
            )
            .bind(month_from)
            .bind(month_before)
            .fetch_one(&self.pool)
            .await?;

        Ok(InvoiceStats {
            total_invoices: total,
            pending_invoices: pending,
            paid_invoices: paid,
            cancelled_invoices: cancelled,
            revenue_cents: revenue,
            month_revenue_cents: month_revenue,
        })
    }
}
