//! # facture-core: Pure Business Logic for Facture
//!
//! This crate holds the order and invoice rules as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Facture Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/api, axum)                    │   │
//! │  │    /api/orders, /api/invoices, /api/products, PDF export        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               facture-db (SQLite, services)                     │   │
//! │  │    one transaction per order mutation                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ facture-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │ totals  │ │ status  │ │  sync   │ │numbering│  │   │
//! │  │   │  money  │ │ HT/TVA/ │ │ PENDING │ │ order ► │ │ CMD-…   │  │   │
//! │  │   │  clock  │ │   TTC   │ │ → PAID… │ │ invoice │ │ FAC-…   │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Invoice, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`totals`] - Order total calculation
//! - [`status`] - Order status transition graph
//! - [`sync`] - Order → invoice synchronization
//! - [`numbering`] - `CMD-`/`FAC-` document numbers
//! - [`clock`] - Injected time source
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use facture_core::{Invoice, Order, OrderLine, OrderStatus, TaxRate};
//! use facture_core::sync::sync_invoice;
//!
//! let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
//! let mut order = Order::new("o-1", "CMD-20260314-0001", "c-1", TaxRate::standard(), now);
//! let mut lines = vec![OrderLine {
//!     id: "l-1".into(),
//!     order_id: "o-1".into(),
//!     product_id: "p-1".into(),
//!     position: 1,
//!     product_name: "Chair".into(),
//!     unit_price_cents: 1000,
//!     quantity: 3,
//!     subtotal_cents: 0,
//!     created_at: now,
//! }];
//!
//! let totals = order.recalculate(&mut lines, now);
//! assert_eq!(totals.total.cents(), 3600);
//!
//! let mut invoice = Invoice::for_order("i-1", "FAC-20260314-0001", &order, "Ada Lovelace", now);
//! order.transition_to(OrderStatus::Paid, now).unwrap();
//! sync_invoice(&order, Some(&mut invoice), now);
//! assert!(invoice.paid_at.is_some());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod error;
pub mod money;
pub mod numbering;
pub mod status;
pub mod sync;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use status::Transition;
pub use totals::OrderTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tax rate applied to new orders, in basis points (20.00%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 2000;

/// Maximum distinct lines on one order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity on a single line.
///
/// Catches typos such as 10000 instead of 10.
pub const MAX_LINE_QUANTITY: i64 = 9_999;
