//! # Status Synchronizer
//!
//! Pushes the state of an order into its invoice after every order
//! mutation.
//!
//! ## Rules
//! ```text
//! ┌──────────────────┬──────────────────────────────────────────────────────┐
//! │ Order status     │ Invoice status                                       │
//! ├──────────────────┼──────────────────────────────────────────────────────┤
//! │ PAID             │ PAID; paid_at = now if not already set               │
//! │ CANCELLED        │ CANCELLED                                            │
//! │ DELIVERED        │ PAID stays PAID, anything else becomes PENDING       │
//! │ PENDING          │ PAID stays PAID, anything else becomes PENDING       │
//! └──────────────────┴──────────────────────────────────────────────────────┘
//! ```
//!
//! HT / tax / TTC, the tax rate and the comment are copied from the order
//! every time, whatever the status. An order with no invoice is left alone.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::{Invoice, InvoiceStatus, Order, OrderStatus, PaymentMethod};

/// Invoice status implied by an order status, given the current one.
pub fn derive_invoice_status(order_status: OrderStatus, current: InvoiceStatus) -> InvoiceStatus {
    match order_status {
        OrderStatus::Paid => InvoiceStatus::Paid,
        OrderStatus::Cancelled => InvoiceStatus::Cancelled,
        OrderStatus::Delivered | OrderStatus::Pending => {
            if current == InvoiceStatus::Paid {
                InvoiceStatus::Paid
            } else {
                InvoiceStatus::Pending
            }
        }
    }
}

/// Reconciles `invoice` with `order`.
///
/// ## Returns
/// `false` when there is no invoice to update, `true` otherwise.
///
/// ## Example
/// ```rust,ignore
/// let mut invoice = invoices.find_by_order(&order.id)?;
/// sync_invoice(&order, invoice.as_mut(), clock.now());
/// ```
pub fn sync_invoice(order: &Order, invoice: Option<&mut Invoice>, now: DateTime<Utc>) -> bool {
    let Some(invoice) = invoice else {
        return false;
    };

    let status = derive_invoice_status(order.status, invoice.status);
    if status == InvoiceStatus::Paid && invoice.paid_at.is_none() {
        invoice.paid_at = Some(now);
    }
    invoice.status = status;
    invoice.order_status = order.status;

    invoice.tax_rate_bps = order.tax_rate_bps;
    invoice.subtotal_cents = order.subtotal_cents;
    invoice.tax_cents = order.tax_cents;
    invoice.total_cents = order.total_cents;
    invoice.comment = order.comment.clone();
    invoice.updated_at = now;
    true
}

impl Invoice {
    /// Issues the invoice for a freshly persisted order.
    ///
    /// Payment method starts empty; status and amounts come from the
    /// synchronizer so creation and later updates follow the same rules.
    pub fn for_order(
        id: impl Into<String>,
        invoice_number: impl Into<String>,
        order: &Order,
        client_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut invoice = Invoice {
            id: id.into(),
            invoice_number: invoice_number.into(),
            order_id: order.id.clone(),
            client_name: client_name.into(),
            status: InvoiceStatus::Pending,
            payment_method: None,
            order_status: order.status,
            tax_rate_bps: order.tax_rate_bps,
            subtotal_cents: 0,
            tax_cents: 0,
            total_cents: 0,
            comment: order.comment.clone(),
            invoice_date: now,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        sync_invoice(order, Some(&mut invoice), now);
        invoice
    }

    /// Records a payment.
    ///
    /// ## Errors
    /// - `InvoiceAlreadyPaid` when already PAID
    /// - `InvoiceCancelled` when CANCELLED
    pub fn mark_paid(&mut self, method: PaymentMethod, now: DateTime<Utc>) -> CoreResult<()> {
        match self.status {
            InvoiceStatus::Paid => Err(CoreError::InvoiceAlreadyPaid {
                invoice_number: self.invoice_number.clone(),
            }),
            InvoiceStatus::Cancelled => Err(CoreError::InvoiceCancelled {
                invoice_number: self.invoice_number.clone(),
            }),
            InvoiceStatus::Pending => {
                self.status = InvoiceStatus::Paid;
                self.paid_at = Some(now);
                self.payment_method = Some(method);
                self.updated_at = now;
                Ok(())
            }
        }
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod, now: DateTime<Utc>) {
        self.payment_method = Some(method);
        self.updated_at = now;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::totals::OrderTotals;
    use crate::types::{OrderLine, TaxRate};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
    }

    fn order_with_total() -> Order {
        let mut order = Order::new("o-1", "CMD-20260314-0001", "c-1", TaxRate::standard(), t0());
        let mut lines = vec![OrderLine {
            id: "l-1".to_string(),
            order_id: "o-1".to_string(),
            product_id: "p-1".to_string(),
            position: 1,
            product_name: "Chair".to_string(),
            unit_price_cents: 1000,
            quantity: 3,
            subtotal_cents: 3000,
            created_at: t0(),
        }];
        order.recalculate(&mut lines, t0());
        order
    }

    fn invoice_for(order: &Order) -> Invoice {
        Invoice::for_order("i-1", "FAC-20260314-0001", order, "Ada Lovelace", t0())
    }

    #[test]
    fn test_invoice_created_pending_with_mirrored_totals() {
        let order = order_with_total();
        let invoice = invoice_for(&order);

        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.payment_method, None);
        assert_eq!(invoice.paid_at, None);
        assert_eq!(invoice.subtotal_cents, 3000);
        assert_eq!(invoice.tax_cents, 600);
        assert_eq!(invoice.total_cents, 3600);
    }

    #[test]
    fn test_paid_order_sets_paid_at_once() {
        let mut order = order_with_total();
        let mut invoice = invoice_for(&order);

        order.transition_to(OrderStatus::Paid, t0()).unwrap();
        let paid_time = t0() + Duration::hours(1);
        assert!(sync_invoice(&order, Some(&mut invoice), paid_time));
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.paid_at, Some(paid_time));

        // Later syncs never overwrite paid_at
        sync_invoice(&order, Some(&mut invoice), paid_time + Duration::days(2));
        assert_eq!(invoice.paid_at, Some(paid_time));
    }

    #[test]
    fn test_cancelled_order_cancels_invoice_and_keeps_amounts() {
        let mut order = order_with_total();
        let mut invoice = invoice_for(&order);

        order.transition_to(OrderStatus::Cancelled, t0()).unwrap();
        sync_invoice(&order, Some(&mut invoice), t0());

        assert_eq!(invoice.status, InvoiceStatus::Cancelled);
        assert_eq!(invoice.order_status, OrderStatus::Cancelled);
        assert_eq!(invoice.total_cents, 3600);
    }

    #[test]
    fn test_delivered_keeps_paid() {
        assert_eq!(
            derive_invoice_status(OrderStatus::Delivered, InvoiceStatus::Paid),
            InvoiceStatus::Paid
        );
        assert_eq!(
            derive_invoice_status(OrderStatus::Delivered, InvoiceStatus::Cancelled),
            InvoiceStatus::Pending
        );
    }

    #[test]
    fn test_pending_never_reverts_paid_invoice() {
        assert_eq!(
            derive_invoice_status(OrderStatus::Pending, InvoiceStatus::Paid),
            InvoiceStatus::Paid
        );
        assert_eq!(
            derive_invoice_status(OrderStatus::Pending, InvoiceStatus::Pending),
            InvoiceStatus::Pending
        );
    }

    #[test]
    fn test_amounts_overwritten_unconditionally() {
        let mut order = order_with_total();
        let mut invoice = invoice_for(&order);
        invoice.mark_paid(PaymentMethod::Card, t0()).unwrap();

        order.apply_totals(OrderTotals::zero(), t0());
        sync_invoice(&order, Some(&mut invoice), t0());

        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.total_cents, 0);
    }

    #[test]
    fn test_missing_invoice_is_noop() {
        let order = order_with_total();
        assert!(!sync_invoice(&order, None, t0()));
    }

    #[test]
    fn test_mark_paid_rules() {
        let order = order_with_total();
        let mut invoice = invoice_for(&order);

        invoice.mark_paid(PaymentMethod::Cheque, t0()).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.payment_method, Some(PaymentMethod::Cheque));
        assert_eq!(invoice.paid_at, Some(t0()));

        let err = invoice.mark_paid(PaymentMethod::Cash, t0()).unwrap_err();
        assert!(matches!(err, CoreError::InvoiceAlreadyPaid { .. }));
        assert!(err.to_string().contains("already paid"));

        let mut cancelled = invoice_for(&order);
        cancelled.status = InvoiceStatus::Cancelled;
        let err = cancelled.mark_paid(PaymentMethod::Cash, t0()).unwrap_err();
        assert!(matches!(err, CoreError::InvoiceCancelled { .. }));
    }
}
