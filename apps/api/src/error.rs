//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Facture                                │
//! │                                                                         │
//! │  Handler ── Result<T, ApiError>                                         │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  ServiceError::Core(CoreError::NotFound)      ──► 404 NOT_FOUND         │
//! │  ServiceError::Core(CoreError::Validation)    ──► 400 VALIDATION_ERROR  │
//! │  ServiceError::Core(business rule)            ──► 400 VALIDATION_ERROR  │
//! │  ServiceError::Core(InvalidTransition)        ──► 409 INVALID_TRANSITION│
//! │  ServiceError::Core(InsufficientStock)        ──► 409 INSUFFICIENT_STOCK│
//! │  ServiceError::Db(unique / check / FK)        ──► 400 VALIDATION_ERROR  │
//! │  ServiceError::Db(anything else), PDF failure ──► 500 (logged, generic) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The body is always:
//! ```json
//! { "code": "NOT_FOUND", "message": "Order not found: 4f1c..." }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pdf::PdfError;
use facture_core::{CoreError, ValidationError};
use facture_db::{DbError, ServiceError};

/// API error returned from handlers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation or business rule failed (400)
    ValidationError,

    /// Order status change not in the graph (409)
    InvalidTransition,

    /// Stock reduction below zero (409)
    InsufficientStock,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidTransition | ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            constraint @ (DbError::UniqueViolation { .. }
            | DbError::CheckViolation { .. }
            | DbError::ForeignKeyViolation) => {
                tracing::warn!("Write rejected by a constraint: {}", constraint);
                ApiError::validation(constraint.to_string())
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::EmptyOrder
            | CoreError::OrderNotEditable { .. }
            | CoreError::OrderAlreadyCancelled { .. }
            | CoreError::OrderAlreadyDelivered { .. }
            | CoreError::InvoiceAlreadyPaid { .. }
            | CoreError::InvoiceCancelled { .. }
            | CoreError::ProductUnavailable { .. }
            | CoreError::ClientInactive { .. }
            | CoreError::StillReferenced { .. }
            | CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::from(CoreError::Validation(err))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(e) => e.into(),
            ServiceError::Db(e) => e.into(),
        }
    }
}

impl From<PdfError> for ApiError {
    fn from(err: PdfError) -> Self {
        tracing::error!("Invoice rendering failed: {}", err);
        ApiError::internal("Could not render the invoice document")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use facture_core::OrderStatus;

    #[test]
    fn test_core_error_codes() {
        let err = ApiError::from(CoreError::not_found("Order", "o-1"));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Order not found: o-1");

        let err = ApiError::from(CoreError::InvalidTransition {
            from: OrderStatus::Paid,
            to: OrderStatus::Pending,
        });
        assert_eq!(err.code.status(), StatusCode::CONFLICT);

        let err = ApiError::from(CoreError::InvoiceAlreadyPaid {
            invoice_number: "FAC-20260314-0001".to_string(),
        });
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("already paid"));
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError::from(ServiceError::Db(DbError::QueryFailed("disk I/O error".to_string())));
        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("disk"));
    }

    #[test]
    fn test_constraint_errors_are_validation() {
        let err = ApiError::from(DbError::UniqueViolation {
            table: "clients".to_string(),
            column: "email".to_string(),
        });
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "email is already used by another clients record");

        let err = ApiError::from(DbError::ForeignKeyViolation);
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_value(ApiError::validation("quantity must be positive")).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "quantity must be positive");
    }
}
