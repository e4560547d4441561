//! # Total Calculator
//!
//! Recomputes an order's subtotal, tax and tax-inclusive total from its
//! lines.
//!
//! ```text
//! lines ──► Σ(unit price × quantity) ──► subtotal (HT)
//!                                          │
//!                         × rate, half-up  ▼
//!                                        tax (TVA)
//!                                          │
//!                        subtotal + tax    ▼
//!                                        total (TTC)
//! ```
//!
//! The calculation is a pure function of the lines and the rate, so running
//! it twice without touching the lines gives the same numbers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Order, OrderLine, TaxRate};

/// Result of a totals calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Totals of an order without lines.
    pub const fn zero() -> Self {
        OrderTotals {
            subtotal: Money::zero(),
            tax: Money::zero(),
            total: Money::zero(),
        }
    }

    /// Computes totals for a set of lines at the given rate.
    ///
    /// Line subtotals are recomputed from unit price and quantity rather
    /// than trusted from storage.
    ///
    /// ## Example
    /// ```rust
    /// use facture_core::totals::OrderTotals;
    /// use facture_core::types::TaxRate;
    ///
    /// let totals = OrderTotals::compute(&[], TaxRate::standard());
    /// assert!(totals.total.is_zero());
    /// ```
    pub fn compute(lines: &[OrderLine], rate: TaxRate) -> Self {
        let subtotal: Money = lines
            .iter()
            .map(|line| line_subtotal(line.unit_price(), line.quantity))
            .sum();
        OrderTotals::from_subtotal(subtotal, rate)
    }

    /// Derives tax and total from an already known subtotal.
    pub fn from_subtotal(subtotal: Money, rate: TaxRate) -> Self {
        let tax = subtotal.calculate_tax(rate);
        OrderTotals {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

/// unit price × quantity.
#[inline]
pub fn line_subtotal(unit_price: Money, quantity: i64) -> Money {
    unit_price.multiply_quantity(quantity)
}

impl Order {
    /// Recomputes totals from `lines` and stores them on the order.
    ///
    /// Also refreshes `updated_at`. Line subtotals are brought back in line
    /// with their unit price and quantity as a side effect.
    pub fn recalculate(&mut self, lines: &mut [OrderLine], now: DateTime<Utc>) -> OrderTotals {
        for line in lines.iter_mut() {
            line.recompute_subtotal();
        }
        let totals = OrderTotals::compute(lines, self.tax_rate());
        self.apply_totals(totals, now);
        totals
    }

    /// Writes computed totals onto the order header.
    pub fn apply_totals(&mut self, totals: OrderTotals, now: DateTime<Utc>) {
        self.subtotal_cents = totals.subtotal.cents();
        self.tax_cents = totals.tax.cents();
        self.total_cents = totals.total.cents();
        self.updated_at = now;
    }

    /// Current totals as stored on the header.
    pub fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal(),
            tax: self.tax(),
            total: self.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, 0, 0).unwrap()
    }

    fn line(unit_price_cents: i64, quantity: i64) -> OrderLine {
        OrderLine {
            id: format!("line-{unit_price_cents}-{quantity}"),
            order_id: "o-1".to_string(),
            product_id: format!("p-{unit_price_cents}"),
            position: 1,
            product_name: "Item".to_string(),
            unit_price_cents,
            quantity,
            subtotal_cents: unit_price_cents * quantity,
            created_at: at(9),
        }
    }

    fn order() -> Order {
        Order::new("o-1", "CMD-20260314-0001", "c-1", TaxRate::standard(), at(9))
    }

    #[test]
    fn test_three_at_ten_with_standard_rate() {
        let mut order = order();
        let mut lines = vec![line(1000, 3)];

        let totals = order.recalculate(&mut lines, at(10));

        assert_eq!(totals.subtotal.cents(), 3000);
        assert_eq!(totals.tax.cents(), 600);
        assert_eq!(totals.total.cents(), 3600);
        assert_eq!(order.total_cents, 3600);
        assert_eq!(order.updated_at, at(10));
    }

    #[test]
    fn test_empty_lines_yield_zero() {
        let mut order = order();
        order.subtotal_cents = 500;
        order.tax_cents = 100;
        order.total_cents = 600;

        let totals = order.recalculate(&mut [], at(10));

        assert_eq!(totals, OrderTotals::zero());
        assert_eq!(order.total_cents, 0);
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let mut order = order();
        let mut lines = vec![line(1999, 2), line(350, 7), line(1, 1)];

        let first = order.recalculate(&mut lines, at(10));
        let snapshot = order.clone();
        let second = order.recalculate(&mut lines, at(10));

        assert_eq!(first, second);
        assert_eq!(snapshot, order);
    }

    #[test]
    fn test_total_is_subtotal_plus_rounded_tax() {
        let rates = [0, 550, 1000, 2000, 2100];
        let lines = vec![line(333, 3), line(1257, 1), line(49, 11)];

        for bps in rates {
            let totals = OrderTotals::compute(&lines, TaxRate::from_bps(bps));
            let expected_subtotal: i64 = lines.iter().map(|l| l.unit_price_cents * l.quantity).sum();
            let expected_tax = (expected_subtotal * bps as i64 + 5000) / 10000;

            assert_eq!(totals.subtotal.cents(), expected_subtotal);
            assert_eq!(totals.tax.cents(), expected_tax);
            assert_eq!(totals.total.cents(), expected_subtotal + expected_tax);
        }
    }

    #[test]
    fn test_stale_line_subtotal_is_repaired() {
        let mut order = order();
        let mut stale = line(500, 2);
        stale.subtotal_cents = 42;
        let mut lines = vec![stale];

        order.recalculate(&mut lines, at(10));

        assert_eq!(lines[0].subtotal_cents, 1000);
        assert_eq!(order.subtotal_cents, 1000);
    }
}
