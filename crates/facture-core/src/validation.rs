//! # Validation Module
//!
//! Input validation for catalog, client and order data.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (apps/api)                                      │
//! │  └── JSON deserialization (types, required fields)                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rules: lengths, positive prices, email shape, ranges     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (product name, client email, document numbers)             │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are counted in characters, not bytes.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const PRODUCT_NAME_MAX: usize = 100;
pub const CATEGORY_NAME_MIN: usize = 2;
pub const CATEGORY_NAME_MAX: usize = 100;
pub const PERSON_NAME_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;
pub const SEARCH_QUERY_MAX: usize = 100;
/// Upper bound for ranked report sizes (`?limit=`).
pub const REPORT_LIMIT_MAX: u32 = 100;
/// Upper bound for look-back windows in days (`?days=`).
pub const REPORT_DAYS_MAX: u32 = 3650;

// =============================================================================
// String Validators
// =============================================================================

fn check_text(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 100 characters
///
/// ## Example
/// ```rust
/// use facture_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Oak desk").is_ok());
/// assert!(validate_product_name("  ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    check_text("name", name, 1, PRODUCT_NAME_MAX)
}

/// Validates a category name (2 to 100 characters).
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    check_text("name", name, CATEGORY_NAME_MIN, CATEGORY_NAME_MAX)
}

/// Validates a client's first or last name.
pub fn validate_person_name(field: &str, name: &str) -> ValidationResult<()> {
    check_text(field, name, 1, PERSON_NAME_MAX)
}

/// Validates an optional free-text field (description, comment).
pub fn validate_description(field: &str, text: Option<&str>) -> ValidationResult<()> {
    match text {
        Some(text) if text.chars().count() > DESCRIPTION_MAX => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: DESCRIPTION_MAX,
        }),
        _ => Ok(()),
    }
}

/// Validates an email address.
///
/// ## Rules
/// - Required
/// - Exactly one `@` with something on both sides
/// - Domain part contains a `.` that is neither first nor last
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(|| invalid("missing @"))?;
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return Err(invalid("not an address"));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must contain a dot"));
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string (may be empty).
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > SEARCH_QUERY_MAX {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: SEARCH_QUERY_MAX,
        });
    }

    Ok(query.to_string())
}

/// Trims an optional text field, turning blank strings into `None`.
pub fn normalize_optional(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a product price in cents.
///
/// ## Example
/// ```rust
/// use facture_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_err());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level or threshold (zero allowed).
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Range & Collection Validators
// =============================================================================

/// Validates a price filter. Both bounds are inclusive.
pub fn validate_price_range(min_cents: Option<i64>, max_cents: Option<i64>) -> ValidationResult<()> {
    for (field, bound) in [("min_price", min_cents), ("max_price", max_cents)] {
        if let Some(bound) = bound {
            validate_non_negative(field, bound)?;
        }
    }

    if let (Some(min), Some(max)) = (min_cents, max_cents) {
        if min > max {
            return Err(ValidationError::InvalidRange {
                field: "price".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a date filter. Either bound may be open.
pub fn validate_date_range(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> ValidationResult<()> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(ValidationError::InvalidRange {
                field: "date".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates the number of distinct lines on an order.
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    Ok(())
}

/// Validates the size of a report window: a row limit or a number of days.
///
/// ## Rules
/// - Between 1 and `max`, inclusive
///
/// ## Example
/// ```rust
/// use facture_core::validation::{validate_report_window, REPORT_LIMIT_MAX};
///
/// assert!(validate_report_window("limit", 10, REPORT_LIMIT_MAX).is_ok());
/// assert!(validate_report_window("limit", 0, REPORT_LIMIT_MAX).is_err());
/// ```
pub fn validate_report_window(field: &str, value: u32, max: u32) -> ValidationResult<()> {
    if value == 0 || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: i64::from(max),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Oak desk").is_ok());
        assert!(validate_product_name(&"é".repeat(100)).is_ok());

        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_category_name() {
        assert!(validate_category_name("Office").is_ok());
        assert!(matches!(
            validate_category_name("A"),
            Err(ValidationError::TooShort { min: 2, .. })
        ));
        assert!(validate_category_name(&"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("first.last@sub.example.fr").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("ada@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@@example.com").is_err());
        assert!(validate_email("ada@example.").is_err());
        assert!(validate_email("a da@example.com").is_err());
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("description", None).is_ok());
        assert!(validate_description("description", Some("short")).is_ok());
        assert!(validate_description("description", Some(&"x".repeat(501))).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(1).is_ok());
        assert!(validate_price_cents(0).is_err());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("stock", 0).is_ok());
        assert!(validate_non_negative("stock", -1).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(2000).is_ok());
        assert!(validate_tax_rate_bps(10000).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }

    #[test]
    fn test_validate_ranges() {
        assert!(validate_price_range(Some(100), Some(100)).is_ok());
        assert!(validate_price_range(None, Some(5)).is_ok());
        assert!(validate_price_range(Some(500), Some(100)).is_err());
        assert!(validate_price_range(Some(-1), None).is_err());

        let early = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        assert!(validate_date_range(Some(early), Some(late)).is_ok());
        assert!(validate_date_range(Some(late), None).is_ok());
        assert!(validate_date_range(Some(late), Some(early)).is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  hi ".to_string())), Some("hi".to_string()));
        assert_eq!(normalize_optional(Some("   ".to_string())), None);
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn test_validate_line_count() {
        assert!(validate_line_count(MAX_ORDER_LINES).is_ok());
        assert!(validate_line_count(MAX_ORDER_LINES + 1).is_err());
    }

    #[test]
    fn test_validate_report_window() {
        assert!(validate_report_window("limit", 1, REPORT_LIMIT_MAX).is_ok());
        assert!(validate_report_window("limit", REPORT_LIMIT_MAX, REPORT_LIMIT_MAX).is_ok());
        assert!(validate_report_window("limit", 0, REPORT_LIMIT_MAX).is_err());
        assert!(matches!(
            validate_report_window("days", REPORT_DAYS_MAX + 1, REPORT_DAYS_MAX),
            Err(ValidationError::OutOfRange { max: 3650, .. })
        ));
    }
}
