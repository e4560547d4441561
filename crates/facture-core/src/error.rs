//! # Error Types
//!
//! Domain-specific error types for facture-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  facture-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  facture-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - CoreError | DbError from a workflow            │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - What the client sees (JSON)                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError → Client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Each variant is recovered at the request boundary and reported to the
/// caller with its message. None of them is transient.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced record does not exist.
    ///
    /// ## When This Occurs
    /// - Order, product, client, category or invoice id is unknown
    /// - Removing a line for a product the order does not contain
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Illegal order status change.
    ///
    /// ## When This Occurs
    /// ```text
    /// PAID ──► PENDING          ✗ (no way back)
    /// CANCELLED ──► anything    ✗ (terminal)
    /// PENDING ──► DELIVERED     ✗ (must be paid first)
    /// ```
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Stock would go below zero.
    ///
    /// Only raised by explicit stock reduction; placing an order never
    /// touches stock.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// An order must be created with at least one line.
    #[error("An order must contain at least one product")]
    EmptyOrder,

    /// Lines, tax rate and similar fields only change while PENDING.
    #[error("Order {order_number} is {status}; it can only be modified while PENDING")]
    OrderNotEditable {
        order_number: String,
        status: OrderStatus,
    },

    #[error("Order {order_number} is already cancelled")]
    OrderAlreadyCancelled { order_number: String },

    /// Delivered goods cannot be cancelled through the cancel workflow.
    #[error("Order {order_number} has already been delivered and cannot be cancelled")]
    OrderAlreadyDelivered { order_number: String },

    #[error("Invoice {invoice_number} is already paid")]
    InvoiceAlreadyPaid { invoice_number: String },

    #[error("Invoice {invoice_number} is cancelled and cannot be paid")]
    InvoiceCancelled { invoice_number: String },

    /// Product exists but is flagged unavailable.
    #[error("Product is not available: {name}")]
    ProductUnavailable { name: String },

    #[error("Client account is inactive: {id}")]
    ClientInactive { id: String },

    /// Deleting a record that other records still point to.
    #[error("{entity} {id} is still referenced by {dependents} and cannot be deleted")]
    StillReferenced {
        entity: String,
        id: String,
        dependents: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(entity: &str, id: &str) -> Self {
        CoreError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Shorthand for [`CoreError::StillReferenced`].
    pub fn still_referenced(entity: &str, id: &str, dependents: &str) -> Self {
        CoreError::StillReferenced {
            entity: entity.to_string(),
            id: id.to_string(),
            dependents: dependents.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid email, invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., product name, client email).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A lower bound is above its upper bound (price range, date range).
    #[error("{field}: lower bound must not exceed upper bound")]
    InvalidRange { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidTransition {
            from: OrderStatus::Paid,
            to: OrderStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Cannot change order status from PAID to PENDING"
        );

        let err = CoreError::not_found("Order", "abc");
        assert_eq!(err.to_string(), "Order not found: abc");

        let err = CoreError::InvoiceAlreadyPaid {
            invoice_number: "FAC-20260314-0001".to_string(),
        };
        assert_eq!(err.to_string(), "Invoice FAC-20260314-0001 is already paid");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "email is required");

        let err = ValidationError::TooShort {
            field: "name".to_string(),
            min: 2,
        };
        assert_eq!(err.to_string(), "name must be at least 2 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
