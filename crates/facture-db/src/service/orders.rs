//! # Order Service
//!
//! The order aggregate: header, lines, totals and the invoice that
//! mirrors it.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    load order + lines                                                   │
//! │    check rule (editable? transition allowed?)                           │
//! │    insert / update / delete lines                                       │
//! │    Order::recalculate  ── HT, tax, TTC from the lines                   │
//! │    write lines + header                                                 │
//! │    sync_invoice        ── amounts + derived status onto the invoice     │
//! │    (first line on an order without invoice: issue FAC- number)          │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Any error before COMMIT drops the transaction, which rolls everything
//! back. Placing an order never moves stock.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::{new_id, ServiceResult};
use crate::pool::Database;
use crate::repository::{client as client_repo, invoice as invoice_repo, order as order_repo};
use crate::repository::{order::OrderFilter, product as product_repo};
use facture_core::clock::day_range;
use facture_core::numbering::{next_invoice_number, next_order_number};
use facture_core::sync::sync_invoice;
use facture_core::validation::{
    normalize_optional, validate_description, validate_line_count, validate_quantity,
    validate_tax_rate_bps,
};
use facture_core::{
    Client, Clock, CoreError, Invoice, Order, OrderDetails, OrderLine, OrderStatus, PaymentMethod,
    Product, TaxRate, Transition,
};

/// One requested line: a product and how many units.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// An order placed in one go, lines included.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub client_id: String,
    /// Defaults to the standard rate.
    #[serde(default)]
    pub tax_rate_bps: Option<u32>,
    #[serde(default)]
    pub comment: Option<String>,
    pub lines: Vec<LineRequest>,
}

#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        OrderService { db, clock }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates a PENDING order with its lines and issues its invoice.
    ///
    /// Requests naming the same product twice are merged into one line.
    ///
    /// ## Errors
    /// - `EmptyOrder` when no line is given
    /// - `NotFound` for an unknown client or product
    /// - `ClientInactive`, `ProductUnavailable`
    /// - `Validation` for quantities, tax rate, comment or line count
    pub async fn create_order_with_lines(&self, request: NewOrder) -> ServiceResult<OrderDetails> {
        if request.lines.is_empty() {
            return Err(CoreError::EmptyOrder.into());
        }
        let tax_rate = checked_tax_rate(request.tax_rate_bps)?;
        let comment = normalize_optional(request.comment);
        validate_description("comment", comment.as_deref())?;
        let requested = merge_lines(&request.lines)?;

        let now = self.clock.now();
        let mut tx = self.db.pool().begin().await?;

        let client = active_client(&mut tx, &request.client_id).await?;
        let mut order = self.open_order(&mut tx, &client, tax_rate, now).await?;
        order.comment = comment;

        let mut lines = Vec::with_capacity(requested.len());
        for (index, (product_id, quantity)) in requested.into_iter().enumerate() {
            let product = orderable_product(&mut tx, &product_id).await?;
            let line = OrderLine::from_product(new_id(), &order.id, &product, quantity, index as i64 + 1, now);
            order_repo::insert_line(&mut *tx, &line).await?;
            lines.push(line);
        }

        persist(&mut tx, &mut order, &mut lines, now).await?;
        let invoice = self.issue_invoice(&mut tx, &order, &client, now).await?;
        tx.commit().await?;

        info!(
            order = %order.order_number,
            invoice = %invoice.invoice_number,
            lines = lines.len(),
            total_cents = order.total_cents,
            "Order created"
        );
        Ok(OrderDetails { order, lines })
    }

    /// Creates an empty PENDING order at the standard rate. Its invoice is
    /// issued when the first line is added.
    pub async fn create_order(&self, client_id: &str) -> ServiceResult<OrderDetails> {
        let now = self.clock.now();
        let mut tx = self.db.pool().begin().await?;

        let client = active_client(&mut tx, client_id).await?;
        let order = self.open_order(&mut tx, &client, TaxRate::standard(), now).await?;
        tx.commit().await?;

        info!(order = %order.order_number, client_id = %client.id, "Empty order created");
        Ok(OrderDetails {
            order,
            lines: Vec::new(),
        })
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// Adds `quantity` units of a product. An existing line for the same
    /// product grows instead of a second line appearing.
    pub async fn add_line(&self, order_id: &str, product_id: &str, quantity: i64) -> ServiceResult<OrderDetails> {
        validate_quantity(quantity)?;

        let now = self.clock.now();
        let mut tx = self.db.pool().begin().await?;
        let (mut order, mut lines) = load(&mut tx, order_id).await?;
        order.ensure_editable()?;
        let product = orderable_product(&mut tx, product_id).await?;

        match lines.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => {
                let merged = line.quantity + quantity;
                validate_quantity(merged)?;
                line.set_quantity(merged);
            }
            None => {
                validate_line_count(lines.len() + 1)?;
                let position = lines.iter().map(|line| line.position).max().unwrap_or(0) + 1;
                let line = OrderLine::from_product(new_id(), &order.id, &product, quantity, position, now);
                order_repo::insert_line(&mut *tx, &line).await?;
                lines.push(line);
            }
        }

        if !persist(&mut tx, &mut order, &mut lines, now).await? {
            let client = client_repo::find_by_id(&mut *tx, &order.client_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Client", &order.client_id))?;
            let invoice = self.issue_invoice(&mut tx, &order, &client, now).await?;
            info!(order = %order.order_number, invoice = %invoice.invoice_number, "Invoice issued");
        }
        tx.commit().await?;

        debug!(order = %order.order_number, product_id = %product_id, quantity = quantity, "Line added");
        Ok(OrderDetails { order, lines })
    }

    /// Drops the line for `product_id`. Removing the last line leaves an
    /// order with zero totals.
    pub async fn remove_line(&self, order_id: &str, product_id: &str) -> ServiceResult<OrderDetails> {
        let now = self.clock.now();
        let mut tx = self.db.pool().begin().await?;
        let (mut order, mut lines) = load(&mut tx, order_id).await?;
        order.ensure_editable()?;

        let index = lines
            .iter()
            .position(|line| line.product_id == product_id)
            .ok_or_else(|| CoreError::not_found("Order line", product_id))?;
        let removed = lines.remove(index);
        order_repo::delete_line(&mut *tx, &removed.id).await?;

        persist(&mut tx, &mut order, &mut lines, now).await?;
        tx.commit().await?;

        debug!(order = %order.order_number, product_id = %product_id, "Line removed");
        Ok(OrderDetails { order, lines })
    }

    /// Replaces the quantity of a line; zero or less removes it.
    pub async fn set_line_quantity(
        &self,
        order_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> ServiceResult<OrderDetails> {
        if quantity <= 0 {
            return self.remove_line(order_id, product_id).await;
        }
        validate_quantity(quantity)?;

        let now = self.clock.now();
        let mut tx = self.db.pool().begin().await?;
        let (mut order, mut lines) = load(&mut tx, order_id).await?;
        order.ensure_editable()?;

        lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or_else(|| CoreError::not_found("Order line", product_id))?
            .set_quantity(quantity);

        persist(&mut tx, &mut order, &mut lines, now).await?;
        tx.commit().await?;

        Ok(OrderDetails { order, lines })
    }

    // =========================================================================
    // Header
    // =========================================================================

    /// Moves the order along the status graph and re-derives the invoice
    /// status. Asking for the current status changes nothing.
    ///
    /// ## Errors
    /// - `InvalidTransition` for an edge missing from the graph
    /// - `EmptyOrder` when an order without lines would become PAID or
    ///   DELIVERED
    pub async fn change_status(&self, order_id: &str, status: OrderStatus) -> ServiceResult<OrderDetails> {
        let now = self.clock.now();
        let mut tx = self.db.pool().begin().await?;
        let (mut order, mut lines) = load(&mut tx, order_id).await?;

        let settles = matches!(status, OrderStatus::Paid | OrderStatus::Delivered);
        if settles && order.status != status && lines.is_empty() {
            return Err(CoreError::EmptyOrder.into());
        }

        match order.transition_to(status, now)? {
            Transition::Unchanged => {
                debug!(order = %order.order_number, status = %status, "Status unchanged");
            }
            Transition::Changed { from, to } => {
                persist(&mut tx, &mut order, &mut lines, now).await?;
                tx.commit().await?;
                info!(order = %order.order_number, from = %from, to = %to, "Order status changed");
            }
        }

        Ok(OrderDetails { order, lines })
    }

    /// Cancels the order; its invoice becomes CANCELLED and keeps the last
    /// amounts.
    ///
    /// ## Errors
    /// - `OrderAlreadyCancelled` on a second call
    /// - `OrderAlreadyDelivered` once the goods went out
    pub async fn cancel_order(&self, order_id: &str) -> ServiceResult<OrderDetails> {
        let now = self.clock.now();
        let mut tx = self.db.pool().begin().await?;
        let (mut order, mut lines) = load(&mut tx, order_id).await?;

        order.cancel(now)?;
        persist(&mut tx, &mut order, &mut lines, now).await?;
        tx.commit().await?;

        info!(order = %order.order_number, "Order cancelled");
        Ok(OrderDetails { order, lines })
    }

    /// Confirms a PENDING order and moves it to PAID after checking that
    /// every product on it can still be sold.
    ///
    /// ## Errors
    /// - `OrderNotEditable` unless the order is PENDING
    /// - `EmptyOrder` when it has no line
    /// - `ProductUnavailable` when a product was withdrawn after being added
    pub async fn validate_order(&self, order_id: &str) -> ServiceResult<OrderDetails> {
        let now = self.clock.now();
        let mut tx = self.db.pool().begin().await?;
        let (mut order, mut lines) = load(&mut tx, order_id).await?;

        order.ensure_editable()?;
        if lines.is_empty() {
            return Err(CoreError::EmptyOrder.into());
        }
        for line in &lines {
            orderable_product(&mut tx, &line.product_id).await?;
        }

        order.transition_to(OrderStatus::Paid, now)?;
        persist(&mut tx, &mut order, &mut lines, now).await?;
        tx.commit().await?;

        info!(order = %order.order_number, total_cents = order.total_cents, "Order validated");
        Ok(OrderDetails { order, lines })
    }

    /// Records the intended payment method on the order's invoice.
    ///
    /// Returns `None` when the order has no invoice.
    pub async fn change_payment_method(
        &self,
        order_id: &str,
        method: PaymentMethod,
    ) -> ServiceResult<Option<Invoice>> {
        let now = self.clock.now();
        let mut tx = self.db.pool().begin().await?;

        if order_repo::find_by_id(&mut *tx, order_id).await?.is_none() {
            return Err(CoreError::not_found("Order", order_id).into());
        }
        let Some(mut invoice) = invoice_repo::find_by_order(&mut *tx, order_id).await? else {
            return Ok(None);
        };

        invoice.set_payment_method(method, now);
        invoice_repo::update(&mut *tx, &invoice).await?;
        tx.commit().await?;

        Ok(Some(invoice))
    }

    /// Changes the tax rate of a PENDING order and recomputes its totals.
    pub async fn update_tax_rate(&self, order_id: &str, tax_rate_bps: u32) -> ServiceResult<OrderDetails> {
        validate_tax_rate_bps(tax_rate_bps)?;

        let now = self.clock.now();
        let mut tx = self.db.pool().begin().await?;
        let (mut order, mut lines) = load(&mut tx, order_id).await?;
        order.ensure_editable()?;

        order.tax_rate_bps = tax_rate_bps;
        persist(&mut tx, &mut order, &mut lines, now).await?;
        tx.commit().await?;

        Ok(OrderDetails { order, lines })
    }

    /// Replaces the free-text comment of any order that is not cancelled.
    pub async fn update_comment(&self, order_id: &str, comment: Option<String>) -> ServiceResult<OrderDetails> {
        let comment = normalize_optional(comment);
        validate_description("comment", comment.as_deref())?;

        let now = self.clock.now();
        let mut tx = self.db.pool().begin().await?;
        let (mut order, mut lines) = load(&mut tx, order_id).await?;
        if order.status == OrderStatus::Cancelled {
            return Err(CoreError::OrderAlreadyCancelled {
                order_number: order.order_number,
            }
            .into());
        }

        order.comment = comment;
        order.updated_at = now;
        persist(&mut tx, &mut order, &mut lines, now).await?;
        tx.commit().await?;

        Ok(OrderDetails { order, lines })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_order(&self, order_id: &str) -> ServiceResult<OrderDetails> {
        self.db
            .orders()
            .get_details(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id).into())
    }

    /// Looks an order up by its `CMD-` number.
    pub async fn get_order_by_number(&self, order_number: &str) -> ServiceResult<OrderDetails> {
        let repo = self.db.orders();
        let order = repo
            .get_by_number(order_number)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_number))?;
        let lines = repo.get_lines(&order.id).await?;
        Ok(OrderDetails { order, lines })
    }

    pub async fn list_orders(&self, filter: &OrderFilter) -> ServiceResult<Vec<Order>> {
        Ok(self.db.orders().list(filter).await?)
    }

    /// Orders created on the clock's current (UTC) day.
    pub async fn todays_orders(&self) -> ServiceResult<Vec<Order>> {
        let (from, before) = day_range(self.clock.today());
        self.list_orders(&OrderFilter {
            created_from: Some(from),
            created_before: Some(before),
            ..OrderFilter::default()
        })
        .await
    }

    pub async fn orders_by_client(&self, client_id: &str) -> ServiceResult<Vec<Order>> {
        if self.db.clients().get_by_id(client_id).await?.is_none() {
            return Err(CoreError::not_found("Client", client_id).into());
        }
        self.list_orders(&OrderFilter {
            client_id: Some(client_id.to_string()),
            ..OrderFilter::default()
        })
        .await
    }

    pub async fn orders_by_status(&self, status: OrderStatus) -> ServiceResult<Vec<Order>> {
        self.list_orders(&OrderFilter {
            status: Some(status),
            ..OrderFilter::default()
        })
        .await
    }

    /// Σ TTC of PAID orders.
    pub async fn revenue(&self) -> ServiceResult<i64> {
        Ok(self.db.orders().paid_revenue().await?)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Numbers and inserts a blank PENDING order.
    async fn open_order(
        &self,
        conn: &mut SqliteConnection,
        client: &Client,
        tax_rate: TaxRate,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        let last = order_repo::last_order_number(&mut *conn).await?;
        let number = next_order_number(last.as_deref(), self.clock.today());

        let order = Order::new(new_id(), number, &client.id, tax_rate, now);
        order_repo::insert(&mut *conn, &order).await?;
        Ok(order)
    }

    /// Numbers and inserts the invoice mirroring `order`.
    async fn issue_invoice(
        &self,
        conn: &mut SqliteConnection,
        order: &Order,
        client: &Client,
        now: DateTime<Utc>,
    ) -> ServiceResult<Invoice> {
        let existing = invoice_repo::count(&mut *conn).await?;
        let number = next_invoice_number(existing, self.clock.today());

        let invoice = Invoice::for_order(new_id(), number, order, client.full_name(), now);
        invoice_repo::insert(&mut *conn, &invoice).await?;
        Ok(invoice)
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

async fn load(conn: &mut SqliteConnection, order_id: &str) -> ServiceResult<(Order, Vec<OrderLine>)> {
    let order = order_repo::find_by_id(&mut *conn, order_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Order", order_id))?;
    let lines = order_repo::lines_for(&mut *conn, order_id).await?;
    Ok((order, lines))
}

async fn active_client(conn: &mut SqliteConnection, client_id: &str) -> ServiceResult<Client> {
    let client = client_repo::find_by_id(&mut *conn, client_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Client", client_id))?;
    if !client.is_active {
        return Err(CoreError::ClientInactive { id: client.id }.into());
    }
    Ok(client)
}

async fn orderable_product(conn: &mut SqliteConnection, product_id: &str) -> ServiceResult<Product> {
    let product = product_repo::find_by_id(&mut *conn, product_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Product", product_id))?;
    if !product.is_available {
        return Err(CoreError::ProductUnavailable { name: product.name }.into());
    }
    Ok(product)
}

/// Recomputes totals, writes lines and header, then mirrors the result
/// onto the invoice.
///
/// ## Returns
/// `false` when the order has no invoice yet.
async fn persist(
    conn: &mut SqliteConnection,
    order: &mut Order,
    lines: &mut [OrderLine],
    now: DateTime<Utc>,
) -> ServiceResult<bool> {
    order.recalculate(lines, now);

    for line in lines.iter() {
        order_repo::update_line(&mut *conn, line).await?;
    }
    order_repo::update_header(&mut *conn, order).await?;

    let mut invoice = invoice_repo::find_by_order(&mut *conn, &order.id).await?;
    if !sync_invoice(order, invoice.as_mut(), now) {
        return Ok(false);
    }
    if let Some(invoice) = &invoice {
        invoice_repo::update(&mut *conn, invoice).await?;
    }

    Ok(true)
}

fn checked_tax_rate(bps: Option<u32>) -> ServiceResult<TaxRate> {
    match bps {
        Some(bps) => {
            validate_tax_rate_bps(bps)?;
            Ok(TaxRate::from_bps(bps))
        }
        None => Ok(TaxRate::standard()),
    }
}

/// Validates quantities and folds repeated products into one entry,
/// keeping first-seen order.
fn merge_lines(requests: &[LineRequest]) -> ServiceResult<Vec<(String, i64)>> {
    let mut merged: Vec<(String, i64)> = Vec::with_capacity(requests.len());
    let mut index: HashMap<&str, usize> = HashMap::new();

    for request in requests {
        validate_quantity(request.quantity)?;
        match index.get(request.product_id.as_str()) {
            Some(&at) => {
                merged[at].1 += request.quantity;
                validate_quantity(merged[at].1)?;
            }
            None => {
                index.insert(request.product_id.as_str(), merged.len());
                merged.push((request.product_id.clone(), request.quantity));
            }
        }
    }

    validate_line_count(merged.len())?;
    Ok(merged)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fixtures::{client, harness, product};
    use crate::service::ServiceError;
    use chrono::Duration;
    use facture_core::InvoiceStatus;

    fn line(product_id: &str, quantity: i64) -> LineRequest {
        LineRequest {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    fn new_order(client_id: &str, lines: Vec<LineRequest>) -> NewOrder {
        NewOrder {
            client_id: client_id.to_string(),
            tax_rate_bps: None,
            comment: None,
            lines,
        }
    }

    #[tokio::test]
    async fn test_create_order_with_lines_computes_totals() {
        let h = harness().await;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;
        let pad = product(&h, "Bloc-notes", 1000).await;

        let details = h
            .services
            .orders
            .create_order_with_lines(new_order(&alice.id, vec![line(&pen.id, 4), line(&pad.id, 1)]))
            .await
            .unwrap();

        assert_eq!(details.order.order_number, "CMD-20260314-0001");
        assert_eq!(details.order.status, OrderStatus::Pending);
        assert_eq!(details.order.subtotal_cents, 3000);
        assert_eq!(details.order.tax_cents, 600);
        assert_eq!(details.order.total_cents, 3600);
        assert_eq!(details.lines.len(), 2);
        assert_eq!(details.lines[0].position, 1);

        let invoice = h.db.invoices().get_by_order(&details.order.id).await.unwrap().unwrap();
        assert_eq!(invoice.invoice_number, "FAC-20260314-0001");
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.total_cents, 3600);
        assert_eq!(invoice.client_name, "Alice Martin");
        assert_eq!(invoice.payment_method, None);
    }

    #[tokio::test]
    async fn test_duplicate_products_are_merged() {
        let h = harness().await;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;

        let details = h
            .services
            .orders
            .create_order_with_lines(new_order(&alice.id, vec![line(&pen.id, 2), line(&pen.id, 3)]))
            .await
            .unwrap();

        assert_eq!(details.lines.len(), 1);
        assert_eq!(details.lines[0].quantity, 5);
        assert_eq!(details.order.subtotal_cents, 2500);
    }

    #[tokio::test]
    async fn test_create_rejections_leave_nothing_behind() {
        let h = harness().await;
        let orders = &h.services.orders;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;

        let err = orders.create_order_with_lines(new_order(&alice.id, vec![])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::EmptyOrder)));

        let err = orders
            .create_order_with_lines(new_order(&alice.id, vec![line(&pen.id, 1), line("ghost", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::NotFound { .. })));

        h.services.catalog.set_product_availability(&pen.id, false).await.unwrap();
        let err = orders
            .create_order_with_lines(new_order(&alice.id, vec![line(&pen.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::ProductUnavailable { .. })));

        assert_eq!(h.db.orders().count().await.unwrap(), 0);
        assert_eq!(h.db.invoices().stats(Utc::now(), Utc::now()).await.unwrap().total_invoices, 0);
    }

    #[tokio::test]
    async fn test_inactive_client_cannot_order() {
        let h = harness().await;
        let alice = client(&h, "alice@example.fr").await;
        h.services.clients.set_client_active(&alice.id, false).await.unwrap();

        let err = h.services.orders.create_order(&alice.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::ClientInactive { .. })));
    }

    #[tokio::test]
    async fn test_numbering_sequences() {
        let h = harness().await;
        let orders = &h.services.orders;
        let alice = client(&h, "alice@example.fr").await;

        let first = orders.create_order(&alice.id).await.unwrap();
        h.clock.advance(Duration::minutes(5));
        let second = orders.create_order(&alice.id).await.unwrap();
        assert_eq!(first.order.order_number, "CMD-20260314-0001");
        assert_eq!(second.order.order_number, "CMD-20260314-0002");

        // Order numbers restart each day, invoice numbers keep counting.
        let pen = product(&h, "Stylo", 500).await;
        orders.add_line(&first.order.id, &pen.id, 1).await.unwrap();
        orders.add_line(&second.order.id, &pen.id, 1).await.unwrap();

        h.clock.advance(Duration::days(1));
        let third = orders
            .create_order_with_lines(new_order(&alice.id, vec![line(&pen.id, 1)]))
            .await
            .unwrap();
        assert_eq!(third.order.order_number, "CMD-20260315-0001");

        let invoice = h.db.invoices().get_by_order(&third.order.id).await.unwrap().unwrap();
        assert_eq!(invoice.invoice_number, "FAC-20260315-0003");
    }

    #[tokio::test]
    async fn test_line_editing_keeps_invoice_in_sync() {
        let h = harness().await;
        let orders = &h.services.orders;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;
        let pad = product(&h, "Bloc-notes", 1000).await;

        let order = orders.create_order(&alice.id).await.unwrap().order;
        assert_eq!(order.total_cents, 0);
        assert!(h.db.invoices().get_by_order(&order.id).await.unwrap().is_none());
        assert!(orders
            .change_payment_method(&order.id, PaymentMethod::Cash)
            .await
            .unwrap()
            .is_none());

        orders.add_line(&order.id, &pen.id, 2).await.unwrap();
        let invoice = h.db.invoices().get_by_order(&order.id).await.unwrap().unwrap();
        assert_eq!(invoice.total_cents, 1200);

        let details = orders.add_line(&order.id, &pen.id, 2).await.unwrap();
        assert_eq!(details.lines.len(), 1);
        assert_eq!(details.lines[0].quantity, 4);

        let details = orders.add_line(&order.id, &pad.id, 1).await.unwrap();
        assert_eq!(details.lines[1].position, 2);
        assert_eq!(details.order.total_cents, 3600);

        let details = orders.set_line_quantity(&order.id, &pad.id, 3).await.unwrap();
        assert_eq!(details.order.subtotal_cents, 5000);

        let invoice = h.db.invoices().get_by_order(&order.id).await.unwrap().unwrap();
        assert_eq!(invoice.subtotal_cents, 5000);
        assert_eq!(invoice.tax_cents, 1000);
        assert_eq!(invoice.total_cents, 6000);

        orders.set_line_quantity(&order.id, &pad.id, 0).await.unwrap();
        let details = orders.remove_line(&order.id, &pen.id).await.unwrap();
        assert!(details.lines.is_empty());
        assert_eq!(details.order.total_cents, 0);

        let invoice = h.db.invoices().get_by_order(&order.id).await.unwrap().unwrap();
        assert_eq!(invoice.total_cents, 0);

        let err = orders.remove_line(&order.id, &pen.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_line_snapshot_survives_price_change() {
        let h = harness().await;
        let orders = &h.services.orders;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;

        let order = orders
            .create_order_with_lines(new_order(&alice.id, vec![line(&pen.id, 1)]))
            .await
            .unwrap()
            .order;

        let mut input = crate::service::ProductInput {
            category_id: None,
            name: "Stylo plume".to_string(),
            description: None,
            price_cents: 900,
            stock_quantity: 10,
            low_stock_threshold: 2,
            is_available: true,
        };
        h.services.catalog.update_product(&pen.id, input.clone()).await.unwrap();

        let details = orders.add_line(&order.id, &pen.id, 1).await.unwrap();
        assert_eq!(details.lines[0].product_name, "Stylo");
        assert_eq!(details.lines[0].subtotal_cents, 1000);

        input.price_cents = 100;
        h.services.catalog.update_product(&pen.id, input).await.unwrap();
        let details = orders.get_order(&order.id).await.unwrap();
        assert_eq!(details.order.subtotal_cents, 1000);
    }

    #[tokio::test]
    async fn test_status_flow_and_invoice_status() {
        let h = harness().await;
        let orders = &h.services.orders;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;

        let order = orders
            .create_order_with_lines(new_order(&alice.id, vec![line(&pen.id, 2)]))
            .await
            .unwrap()
            .order;

        let err = orders.change_status(&order.id, OrderStatus::Delivered).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::InvalidTransition { .. })));

        let details = orders.change_status(&order.id, OrderStatus::Paid).await.unwrap();
        assert_eq!(details.order.status, OrderStatus::Paid);
        let invoice = h.db.invoices().get_by_order(&order.id).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.order_status, OrderStatus::Paid);

        // Same status again is a no-op.
        orders.change_status(&order.id, OrderStatus::Paid).await.unwrap();

        let err = orders.add_line(&order.id, &pen.id, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::OrderNotEditable { .. })));
        let err = orders.update_tax_rate(&order.id, 550).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::OrderNotEditable { .. })));

        orders.change_status(&order.id, OrderStatus::Delivered).await.unwrap();
        assert_eq!(orders.revenue().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancel_pending_order_cancels_invoice() {
        let h = harness().await;
        let orders = &h.services.orders;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;

        let order = orders
            .create_order_with_lines(new_order(&alice.id, vec![line(&pen.id, 2)]))
            .await
            .unwrap()
            .order;

        let details = orders.cancel_order(&order.id).await.unwrap();
        assert_eq!(details.order.status, OrderStatus::Cancelled);

        let invoice = h.db.invoices().get_by_order(&order.id).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Cancelled);
        assert_eq!(invoice.order_status, OrderStatus::Cancelled);

        let err = orders.cancel_order(&order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::OrderAlreadyCancelled { .. })));

        let err = orders.update_comment(&order.id, Some("late".to_string())).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::OrderAlreadyCancelled { .. })));
    }

    #[tokio::test]
    async fn test_delivered_order_cannot_be_cancelled() {
        let h = harness().await;
        let orders = &h.services.orders;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;

        let order = orders
            .create_order_with_lines(new_order(&alice.id, vec![line(&pen.id, 2)]))
            .await
            .unwrap()
            .order;
        orders.change_status(&order.id, OrderStatus::Paid).await.unwrap();
        orders.change_status(&order.id, OrderStatus::Delivered).await.unwrap();

        let err = orders.cancel_order(&order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::OrderAlreadyDelivered { .. })));

        let details = orders.get_order(&order.id).await.unwrap();
        assert_eq!(details.order.status, OrderStatus::Delivered);
        let invoice = h.db.invoices().get_by_order(&order.id).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_order_without_lines_cannot_be_paid() {
        let h = harness().await;
        let orders = &h.services.orders;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;

        let empty = orders.create_order(&alice.id).await.unwrap().order;
        let err = orders.change_status(&empty.id, OrderStatus::Paid).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::EmptyOrder)));

        let details = orders.get_order(&empty.id).await.unwrap();
        assert_eq!(details.order.status, OrderStatus::Pending);
        assert!(h.db.invoices().get_by_order(&empty.id).await.unwrap().is_none());

        // Still editable, so the first line issues the invoice.
        orders.add_line(&empty.id, &pen.id, 1).await.unwrap();
        orders.change_status(&empty.id, OrderStatus::Paid).await.unwrap();
        let invoice = h.db.invoices().get_by_order(&empty.id).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);

        // Cancelling an empty order is still allowed.
        let other = orders.create_order(&alice.id).await.unwrap().order;
        let details = orders.change_status(&other.id, OrderStatus::Cancelled).await.unwrap();
        assert_eq!(details.order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_validate_order() {
        let h = harness().await;
        let orders = &h.services.orders;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;

        let empty = orders.create_order(&alice.id).await.unwrap().order;
        let err = orders.validate_order(&empty.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::EmptyOrder)));

        let order = orders
            .create_order_with_lines(new_order(&alice.id, vec![line(&pen.id, 2)]))
            .await
            .unwrap()
            .order;

        h.services.catalog.set_product_availability(&pen.id, false).await.unwrap();
        let err = orders.validate_order(&order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::ProductUnavailable { .. })));

        h.services.catalog.set_product_availability(&pen.id, true).await.unwrap();
        let details = orders.validate_order(&order.id).await.unwrap();
        assert_eq!(details.order.status, OrderStatus::Paid);

        let invoice = h.db.invoices().get_by_order(&order.id).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert!(invoice.paid_at.is_some());

        let err = orders.validate_order(&order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::OrderNotEditable { .. })));
    }

    #[tokio::test]
    async fn test_tax_rate_comment_and_payment_method() {
        let h = harness().await;
        let orders = &h.services.orders;
        let alice = client(&h, "alice@example.fr").await;
        let pad = product(&h, "Bloc-notes", 1000).await;

        let order = orders
            .create_order_with_lines(new_order(&alice.id, vec![line(&pad.id, 1)]))
            .await
            .unwrap()
            .order;

        let details = orders.update_tax_rate(&order.id, 550).await.unwrap();
        assert_eq!(details.order.tax_cents, 55);
        assert_eq!(details.order.total_cents, 1055);
        assert!(orders.update_tax_rate(&order.id, 10_001).await.is_err());

        orders
            .update_comment(&order.id, Some("  Livrer le matin ".to_string()))
            .await
            .unwrap();

        let invoice = orders
            .change_payment_method(&order.id, PaymentMethod::Card)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.payment_method, Some(PaymentMethod::Card));
        assert_eq!(invoice.tax_rate_bps, 550);
        assert_eq!(invoice.comment.as_deref(), Some("Livrer le matin"));
        assert_eq!(invoice.status, InvoiceStatus::Pending);
    }

    #[tokio::test]
    async fn test_queries() {
        let h = harness().await;
        let orders = &h.services.orders;
        let alice = client(&h, "alice@example.fr").await;
        let bob = client(&h, "bob@example.fr").await;
        let pad = product(&h, "Bloc-notes", 1000).await;

        let yesterday = orders
            .create_order_with_lines(new_order(&alice.id, vec![line(&pad.id, 1)]))
            .await
            .unwrap()
            .order;
        orders.change_status(&yesterday.id, OrderStatus::Paid).await.unwrap();

        h.clock.advance(Duration::days(1));
        orders.create_order(&bob.id).await.unwrap();

        assert_eq!(orders.todays_orders().await.unwrap().len(), 1);
        assert_eq!(orders.orders_by_client(&alice.id).await.unwrap().len(), 1);
        assert_eq!(orders.orders_by_status(OrderStatus::Pending).await.unwrap().len(), 1);
        assert_eq!(orders.revenue().await.unwrap(), 1200);
        assert!(orders.orders_by_client("nobody").await.is_err());

        let found = orders.get_order_by_number(&yesterday.order_number).await.unwrap();
        assert_eq!(found.order.id, yesterday.id);
        assert_eq!(found.lines.len(), 1);
        let err = orders.get_order_by_number("CMD-19990101-0001").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::NotFound { .. })));
    }
}
