//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Integer Cents
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every amount on an order or invoice is an i64 number of cents.        │
//! │                                                                         │
//! │    unit price 10.00  → 1000                                            │
//! │    × quantity 3      → 3000   (subtotal / HT)                          │
//! │    × 20.00% tax      →  600   (tax / TVA)                              │
//! │    = total           → 3600   (TTC)                                    │
//! │                                                                         │
//! │  Sums are exact. The only rounding step is the tax multiplication,     │
//! │  which rounds half-up to the nearest cent.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use facture_core::money::Money;
//!
//! let price = Money::from_cents(1050); // 10.50
//! let line = price.multiply_quantity(2);
//! assert_eq!(line.cents(), 2100);
//! assert_eq!(line.to_string(), "21.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// Currency is not part of the value: a deployment works in a single
/// currency, configured at the edge (see the PDF renderer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use facture_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (euros and cents).
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is strictly positive.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates the tax owed on this amount, rounded half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math on basis points: `(amount * bps + 5000) / 10000`.
    /// i128 keeps large invoices from overflowing the intermediate product.
    ///
    /// ## Example
    /// ```rust
    /// use facture_core::money::Money;
    /// use facture_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(3000);     // 30.00
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(2000)); // 20.00%
    /// assert_eq!(tax.cents(), 600);
    ///
    /// // 0.125 rounds up to 0.13
    /// let tax = Money::from_cents(125).calculate_tax(TaxRate::from_bps(1000));
    /// assert_eq!(tax.cents(), 13);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let product = self.0 as i128 * rate.bps() as i128;
        let tax_cents = if product >= 0 {
            (product + 5000) / 10000
        } else {
            (product - 5000) / 10000
        };
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering, two fraction digits, no currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(3600).to_string(), "36.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let mut c = a;
        c += b;
        c -= Money::from_cents(100);
        assert_eq!(c.cents(), 1400);
    }

    #[test]
    fn test_sum() {
        let amounts = vec![
            Money::from_cents(1000),
            Money::from_cents(250),
            Money::from_cents(1),
        ];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.cents(), 1251);

        let empty: Vec<Money> = Vec::new();
        assert!(empty.into_iter().sum::<Money>().is_zero());
    }

    #[test]
    fn test_tax_standard_rate() {
        let tax = Money::from_cents(3000).calculate_tax(TaxRate::from_bps(2000));
        assert_eq!(tax.cents(), 600);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 0.33 at 5.5% = 0.01815 → 0.02
        let tax = Money::from_cents(33).calculate_tax(TaxRate::from_bps(550));
        assert_eq!(tax.cents(), 2);

        // 0.05 at 10% = 0.005 → 0.01
        let tax = Money::from_cents(5).calculate_tax(TaxRate::from_bps(1000));
        assert_eq!(tax.cents(), 1);

        // 0.04 at 10% = 0.004 → 0.00
        let tax = Money::from_cents(4).calculate_tax(TaxRate::from_bps(1000));
        assert_eq!(tax.cents(), 0);
    }

    #[test]
    fn test_tax_zero_rate() {
        let tax = Money::from_cents(123_456).calculate_tax(TaxRate::zero());
        assert!(tax.is_zero());
    }

    #[test]
    fn test_tax_large_amount_does_not_overflow() {
        let huge = Money::from_cents(i64::MAX / 20_000);
        let tax = huge.calculate_tax(TaxRate::from_bps(10_000));
        assert_eq!(tax, huge);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::zero().is_positive());
    }
}
