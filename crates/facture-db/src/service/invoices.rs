//! # Invoice Service
//!
//! Reads over the invoice projection, plus the one write a user makes on
//! it directly: recording a payment.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::ServiceResult;
use crate::pool::Database;
use crate::repository::invoice::{self as invoice_repo, InvoiceFilter, InvoiceStats};
use facture_core::clock::month_range;
use facture_core::validation::validate_date_range;
use facture_core::{Client, Clock, CoreError, Invoice, Order, OrderLine, PaymentMethod};

/// Everything the PDF renderer needs for one invoice.
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub invoice: Invoice,
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub client: Client,
}

#[derive(Debug, Clone)]
pub struct InvoiceService {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl InvoiceService {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        InvoiceService { db, clock }
    }

    /// Records payment of a PENDING invoice.
    ///
    /// The order status is left alone; the two statuses are tracked
    /// independently.
    ///
    /// ## Errors
    /// - `InvoiceAlreadyPaid`, `InvoiceCancelled`
    pub async fn mark_paid(&self, invoice_id: &str, method: PaymentMethod) -> ServiceResult<Invoice> {
        let now = self.clock.now();
        let mut tx = self.db.pool().begin().await?;

        let mut invoice = invoice_repo::find_by_id(&mut *tx, invoice_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Invoice", invoice_id))?;
        invoice.mark_paid(method, now)?;
        invoice_repo::update(&mut *tx, &invoice).await?;
        tx.commit().await?;

        info!(invoice = %invoice.invoice_number, method = %method, "Invoice paid");
        Ok(invoice)
    }

    pub async fn get_invoice(&self, invoice_id: &str) -> ServiceResult<Invoice> {
        self.db
            .invoices()
            .get_by_id(invoice_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Invoice", invoice_id).into())
    }

    pub async fn get_by_number(&self, invoice_number: &str) -> ServiceResult<Invoice> {
        self.db
            .invoices()
            .get_by_number(invoice_number)
            .await?
            .ok_or_else(|| CoreError::not_found("Invoice", invoice_number).into())
    }

    pub async fn get_by_order(&self, order_id: &str) -> ServiceResult<Invoice> {
        self.db
            .invoices()
            .get_by_order(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Invoice for order", order_id).into())
    }

    /// Invoices matching any combination of status, client and date range.
    pub async fn filter(&self, filter: &InvoiceFilter) -> ServiceResult<Vec<Invoice>> {
        validate_date_range(filter.from, filter.to)?;
        Ok(self.db.invoices().filter(filter).await?)
    }

    /// PENDING invoices, oldest first.
    pub async fn unprocessed(&self) -> ServiceResult<Vec<Invoice>> {
        Ok(self.db.invoices().list_unprocessed().await?)
    }

    /// Invoices whose payment was recorded in the clock's current month.
    pub async fn paid_this_month(&self) -> ServiceResult<Vec<Invoice>> {
        let (from, before) = self.current_month();
        Ok(self.db.invoices().list_paid_between(from, before).await?)
    }

    pub async fn client_history(&self, client_id: &str) -> ServiceResult<Vec<Invoice>> {
        if self.db.clients().get_by_id(client_id).await?.is_none() {
            return Err(CoreError::not_found("Client", client_id).into());
        }
        Ok(self.db.invoices().list_by_client(client_id).await?)
    }

    pub async fn stats(&self) -> ServiceResult<InvoiceStats> {
        let (from, before) = self.current_month();
        Ok(self.db.invoices().stats(from, before).await?)
    }

    /// Loads an invoice with its order, lines and client.
    pub async fn document(&self, invoice_id: &str) -> ServiceResult<InvoiceDocument> {
        let invoice = self.get_invoice(invoice_id).await?;

        let details = self
            .db
            .orders()
            .get_details(&invoice.order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", &invoice.order_id))?;
        let client = self
            .db
            .clients()
            .get_by_id(&details.order.client_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Client", &details.order.client_id))?;

        Ok(InvoiceDocument {
            invoice,
            order: details.order,
            lines: details.lines,
            client,
        })
    }

    fn current_month(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        month_range(self.clock.today())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fixtures::{client, harness, product, Harness};
    use crate::service::{LineRequest, NewOrder, ServiceError};
    use chrono::{Duration, TimeZone};
    use facture_core::{InvoiceStatus, OrderStatus};

    async fn invoiced_order(h: &Harness, client_id: &str, product_id: &str, quantity: i64) -> Invoice {
        let details = h
            .services
            .orders
            .create_order_with_lines(NewOrder {
                client_id: client_id.to_string(),
                tax_rate_bps: None,
                comment: None,
                lines: vec![LineRequest {
                    product_id: product_id.to_string(),
                    quantity,
                }],
            })
            .await
            .unwrap();
        h.db.invoices().get_by_order(&details.order.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_mark_paid_once() {
        let h = harness().await;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;
        let invoice = invoiced_order(&h, &alice.id, &pen.id, 2).await;

        let paid = h.services.invoices.mark_paid(&invoice.id, PaymentMethod::Cheque).await.unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert_eq!(paid.payment_method, Some(PaymentMethod::Cheque));
        assert_eq!(paid.paid_at, Some(h.clock.now()));

        let err = h.services.invoices.mark_paid(&invoice.id, PaymentMethod::Cash).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::InvoiceAlreadyPaid { .. })));

        // The order itself is untouched.
        let order = h.services.orders.get_order(&invoice.order_id).await.unwrap().order;
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_cancelled_invoice_cannot_be_paid() {
        let h = harness().await;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;
        let invoice = invoiced_order(&h, &alice.id, &pen.id, 1).await;

        h.services.orders.cancel_order(&invoice.order_id).await.unwrap();

        let err = h.services.invoices.mark_paid(&invoice.id, PaymentMethod::Card).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::InvoiceCancelled { .. })));

        let cancelled = h.services.invoices.get_invoice(&invoice.id).await.unwrap();
        assert_eq!(cancelled.total_cents, 600);
    }

    #[tokio::test]
    async fn test_filters_and_month_figures() {
        let h = harness().await;
        let invoices = &h.services.invoices;
        let alice = client(&h, "alice@example.fr").await;
        let bob = client(&h, "bob@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;

        // February: paid at the end of the month.
        h.clock.set(Utc.with_ymd_and_hms(2026, 2, 27, 10, 0, 0).unwrap());
        let february = invoiced_order(&h, &alice.id, &pen.id, 1).await;
        invoices.mark_paid(&february.id, PaymentMethod::Cash).await.unwrap();

        // March.
        h.clock.set(Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap());
        let march = invoiced_order(&h, &bob.id, &pen.id, 2).await;
        invoices.mark_paid(&march.id, PaymentMethod::Card).await.unwrap();
        h.clock.advance(Duration::days(1));
        let pending = invoiced_order(&h, &bob.id, &pen.id, 3).await;

        let paid = invoices.paid_this_month().await.unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].id, march.id);

        let unprocessed = invoices.unprocessed().await.unwrap();
        assert_eq!(unprocessed.len(), 1);
        assert_eq!(unprocessed[0].id, pending.id);

        let bob_history = invoices.client_history(&bob.id).await.unwrap();
        assert_eq!(bob_history.len(), 2);
        assert_eq!(bob_history[0].id, pending.id);

        let in_march = invoices
            .filter(&InvoiceFilter {
                from: Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()),
                to: Some(Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap()),
                ..InvoiceFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(in_march.len(), 1);
        assert_eq!(in_march[0].id, march.id);

        let bad_range = invoices
            .filter(&InvoiceFilter {
                from: Some(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()),
                to: Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()),
                ..InvoiceFilter::default()
            })
            .await;
        assert!(bad_range.is_err());

        let stats = invoices.stats().await.unwrap();
        assert_eq!(stats.total_invoices, 3);
        assert_eq!(stats.paid_invoices, 2);
        assert_eq!(stats.pending_invoices, 1);
        assert_eq!(stats.revenue_cents, 600 + 1200);
        assert_eq!(stats.month_revenue_cents, 1200);
    }

    #[tokio::test]
    async fn test_document_loads_everything() {
        let h = harness().await;
        let alice = client(&h, "alice@example.fr").await;
        let pen = product(&h, "Stylo", 500).await;
        let invoice = invoiced_order(&h, &alice.id, &pen.id, 2).await;

        let doc = h.services.invoices.document(&invoice.id).await.unwrap();
        assert_eq!(doc.client.id, alice.id);
        assert_eq!(doc.lines.len(), 1);
        assert_eq!(doc.order.total_cents, 1200);

        let by_number = h.services.invoices.get_by_number(&invoice.invoice_number).await.unwrap();
        assert_eq!(by_number.id, invoice.id);
        assert!(h.services.invoices.get_invoice("missing").await.is_err());
    }
}
