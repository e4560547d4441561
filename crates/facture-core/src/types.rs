//! # Domain Types
//!
//! Core domain types used throughout Facture.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄──│    Product      │   │     Client      │       │
//! │  │  name, active   │   │  price_cents    │   │  email, names   │       │
//! │  └─────────────────┘   │  stock          │   └────────┬────────┘       │
//! │                        └────────▲────────┘            │ client_id      │
//! │                                 │ product_id          ▼                │
//! │                        ┌────────┴────────┐   ┌─────────────────┐       │
//! │                        │   OrderLine     │──►│     Order       │       │
//! │                        │  name snapshot  │   │  order_number   │       │
//! │                        │  unit price     │   │  status, totals │       │
//! │                        └─────────────────┘   └────────▲────────┘       │
//! │                                                       │ order_id (1:1) │
//! │                                              ┌────────┴────────┐       │
//! │                                              │    Invoice      │       │
//! │                                              │  invoice_number │       │
//! │                                              │  mirrored totals│       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## References
//! Every relation is a foreign key held by the child (`OrderLine.order_id`,
//! `Invoice.order_id`). Nothing holds a pointer back to its parent; callers
//! load related records through the repositories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::DEFAULT_TAX_RATE_BPS;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so the standard 20.00% rate is 2000 bps.
/// Two decimal places of percentage are exactly representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// The rate every new order starts with (20.00%).
    #[inline]
    pub const fn standard() -> Self {
        TaxRate(DEFAULT_TAX_RATE_BPS)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::standard()
    }
}

/// Renders as a percentage with two decimals: `20.00%`.
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// Stock is informational: placing an order does not reserve or decrement
/// it. It only moves through the explicit stock operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning category, if any.
    pub category_id: Option<String>,

    /// Display name, unique across the catalog (case-insensitive).
    pub name: String,

    /// Optional long description.
    pub description: Option<String>,

    /// Current selling price in cents. Always positive.
    pub price_cents: i64,

    /// Units on hand.
    pub stock_quantity: i64,

    /// Stock level at or below which the product is reported as low.
    pub low_stock_threshold: i64,

    /// Whether the product can be added to orders.
    pub is_available: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// In stock but at or below the alert threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity > 0 && self.stock_quantity <= self.low_stock_threshold
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock_quantity == 0
    }
}

// =============================================================================
// Client
// =============================================================================

/// Role stored on a client record. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Client,
    Admin,
}

/// A customer who owns orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    /// Unique, compared case-insensitively.
    pub email: String,
    pub last_name: String,
    pub first_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// "First Last", as printed on invoices.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle status of an order.
///
/// Transition rules live in [`crate::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Being assembled; lines can change.
    #[default]
    Pending,
    /// Paid by the client.
    Paid,
    /// Handed over to the client.
    Delivered,
    /// Terminal.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Upper-case code, as used in messages and documents.
    pub const fn code(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| not_allowed("status", OrderStatus::ALL.iter().map(|s| s.code())))
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

/// Payment status of an invoice, tracked separately from the order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 3] = [
        InvoiceStatus::Pending,
        InvoiceStatus::Paid,
        InvoiceStatus::Cancelled,
    ];

    pub const fn code(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }

    /// Human label for listings and documents.
    pub const fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| not_allowed("status", InvoiceStatus::ALL.iter().map(|s| s.code())))
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Cheque,
    Transfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Cheque,
        PaymentMethod::Transfer,
    ];

    pub const fn code(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Cheque => "CHEQUE",
            PaymentMethod::Transfer => "TRANSFER",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Bank card",
            PaymentMethod::Cheque => "Cheque",
            PaymentMethod::Transfer => "Bank transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                not_allowed("payment_method", PaymentMethod::ALL.iter().map(|m| m.code()))
            })
    }
}

fn not_allowed<'a>(field: &str, allowed: impl Iterator<Item = &'a str>) -> ValidationError {
    ValidationError::NotAllowed {
        field: field.to_string(),
        allowed: allowed.map(str::to_string).collect(),
    }
}

// =============================================================================
// Order
// =============================================================================

/// Order header. Lines are stored separately and reference it by `order_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// `CMD-YYYYMMDD-NNNN`.
    pub order_number: String,
    pub client_id: String,
    pub status: OrderStatus,
    pub tax_rate_bps: u32,
    /// Sum of line subtotals (HT).
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    /// Tax-inclusive total (TTC).
    pub total_cents: i64,
    pub comment: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a fresh PENDING order with zero totals.
    pub fn new(
        id: impl Into<String>,
        order_number: impl Into<String>,
        client_id: impl Into<String>,
        tax_rate: TaxRate,
        now: DateTime<Utc>,
    ) -> Self {
        Order {
            id: id.into(),
            order_number: order_number.into(),
            client_id: client_id.into(),
            status: OrderStatus::Pending,
            tax_rate_bps: tax_rate.bps(),
            subtotal_cents: 0,
            tax_cents: 0,
            total_cents: 0,
            comment: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item on an order.
/// Uses snapshot pattern: product name and unit price are frozen when the
/// line is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// 1-based display order within the order.
    pub position: i64,
    /// Product name at time of adding (frozen).
    pub product_name: String,
    /// Unit price in cents at time of adding (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    /// Creates a line from the product's current name and price.
    pub fn from_product(
        id: impl Into<String>,
        order_id: impl Into<String>,
        product: &Product,
        quantity: i64,
        position: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let mut line = OrderLine {
            id: id.into(),
            order_id: order_id.into(),
            product_id: product.id.clone(),
            position,
            product_name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            subtotal_cents: 0,
            created_at: now,
        };
        line.recompute_subtotal();
        line
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    /// Replaces the quantity and refreshes the subtotal.
    pub fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.recompute_subtotal();
    }

    pub fn recompute_subtotal(&mut self) {
        self.subtotal_cents = self.unit_price().multiply_quantity(self.quantity).cents();
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// Billing record derived 1:1 from an order.
///
/// Monetary fields are a mirror of the order, refreshed by
/// [`crate::sync::sync_invoice`] after every order mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// `FAC-YYYYMMDD-NNNN`.
    pub invoice_number: String,
    pub order_id: String,
    /// Client's full name at the time the invoice was issued.
    pub client_name: String,
    pub status: InvoiceStatus,
    pub payment_method: Option<PaymentMethod>,
    /// Last order status seen by the synchronizer.
    pub order_status: OrderStatus,
    pub tax_rate_bps: u32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub comment: Option<String>,
    #[ts(as = "String")]
    pub invoice_date: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// An order together with its lines, in position order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetails {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl OrderDetails {
    /// Finds the line for a product, if the order has one.
    pub fn line_for_product(&self, product_id: &str) -> Option<&OrderLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_product(price_cents: i64) -> Product {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        Product {
            id: "p-1".to_string(),
            category_id: None,
            name: "Desk lamp".to_string(),
            description: None,
            price_cents,
            stock_quantity: 3,
            low_stock_threshold: 5,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_tax_rate_default_is_standard() {
        assert_eq!(TaxRate::default().bps(), 2000);
        assert_eq!(TaxRate::default().to_string(), "20.00%");
        assert_eq!(TaxRate::from_bps(550).to_string(), "5.50%");
    }

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("paid".parse::<OrderStatus>().unwrap(), OrderStatus::Paid);
        assert_eq!("DELIVERED".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert_eq!(" pending ".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Pending);
        assert_eq!("Cheque".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cheque);
    }

    #[test]
    fn test_status_parsing_rejects_unknown() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { .. }));
        assert!(err.to_string().contains("PENDING"));
    }

    #[test]
    fn test_line_from_product_snapshots_price() {
        let mut product = sample_product(1000);
        let line = OrderLine::from_product("l-1", "o-1", &product, 3, 1, product.created_at);

        product.price_cents = 2500;

        assert_eq!(line.unit_price_cents, 1000);
        assert_eq!(line.subtotal_cents, 3000);
        assert_eq!(line.product_name, "Desk lamp");
    }

    #[test]
    fn test_line_set_quantity_recomputes_subtotal() {
        let product = sample_product(250);
        let mut line = OrderLine::from_product("l-1", "o-1", &product, 1, 1, product.created_at);
        line.set_quantity(4);
        assert_eq!(line.subtotal_cents, 1000);
    }

    #[test]
    fn test_stock_flags() {
        let mut product = sample_product(100);
        assert!(product.is_low_stock());
        assert!(!product.is_out_of_stock());

        product.stock_quantity = 0;
        assert!(!product.is_low_stock());
        assert!(product.is_out_of_stock());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Delivered).unwrap();
        assert_eq!(json, "\"delivered\"");
        let json = serde_json::to_string(&PaymentMethod::Transfer).unwrap();
        assert_eq!(json, "\"transfer\"");
    }
}
