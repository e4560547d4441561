//! # Document Numbering
//!
//! Human-readable identifiers for orders and invoices.
//!
//! ## Format
//! ```text
//! CMD-20260314-0007
//! ─┬─ ───┬──── ──┬─
//!  │     │       └── sequence, zero-padded to 4 digits
//!  │     └────────── calendar date (UTC) of creation
//!  └──────────────── CMD = order, FAC = invoice
//! ```
//!
//! ## Sequences
//! - Orders restart at 1 every day. The next number is derived from the
//!   most recently created order.
//! - Invoices use the total number of invoices ever issued + 1, so their
//!   sequence keeps growing across days.
//!
//! Neither scheme is guarded against two requests numbering at the same
//! time; the UNIQUE constraint in the database rejects the loser.

use chrono::NaiveDate;

/// Prefix for order numbers.
pub const ORDER_PREFIX: &str = "CMD";

/// Prefix for invoice numbers.
pub const INVOICE_PREFIX: &str = "FAC";

const DATE_FORMAT: &str = "%Y%m%d";

/// A parsed `<PREFIX>-<YYYYMMDD>-<NNNN>` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentNumber<'a> {
    pub prefix: &'a str,
    pub date: NaiveDate,
    pub sequence: u32,
}

/// Formats a document number.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use facture_core::numbering::format_number;
///
/// let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
/// assert_eq!(format_number("CMD", day, 7), "CMD-20260314-0007");
/// ```
pub fn format_number(prefix: &str, date: NaiveDate, sequence: u32) -> String {
    format!("{}-{}-{:04}", prefix, date.format(DATE_FORMAT), sequence)
}

/// Parses a document number. Returns `None` for anything malformed.
pub fn parse_number(number: &str) -> Option<DocumentNumber<'_>> {
    let mut parts = number.splitn(3, '-');
    let prefix = parts.next()?;
    let date_part = parts.next()?;
    let sequence_part = parts.next()?;

    if prefix.is_empty() || date_part.len() != 8 || sequence_part.is_empty() {
        return None;
    }
    if !sequence_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()?;
    let sequence = sequence_part.parse().ok()?;

    Some(DocumentNumber {
        prefix,
        date,
        sequence,
    })
}

/// Next order number for `today`, given the latest order number on file.
///
/// The sequence continues only if `last` carries today's date;
/// otherwise (no previous order, another day, unparsable) it restarts at 1.
pub fn next_order_number(last: Option<&str>, today: NaiveDate) -> String {
    let sequence = last
        .and_then(parse_number)
        .filter(|parsed| parsed.prefix == ORDER_PREFIX && parsed.date == today)
        .map(|parsed| parsed.sequence.saturating_add(1))
        .unwrap_or(1);

    format_number(ORDER_PREFIX, today, sequence)
}

/// Next invoice number: global invoice count + 1.
pub fn next_invoice_number(existing_invoices: i64, today: NaiveDate) -> String {
    let sequence = u32::try_from(existing_invoices.max(0))
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1);

    format_number(INVOICE_PREFIX, today, sequence)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_first_order_of_all_time() {
        assert_eq!(next_order_number(None, day(14)), "CMD-20260314-0001");
    }

    #[test]
    fn test_same_day_increments() {
        let first = next_order_number(None, day(14));
        let second = next_order_number(Some(&first), day(14));
        let third = next_order_number(Some(&second), day(14));

        assert_eq!(second, "CMD-20260314-0002");
        assert_eq!(third, "CMD-20260314-0003");
        assert!(first < second && second < third);
    }

    #[test]
    fn test_new_day_restarts() {
        assert_eq!(
            next_order_number(Some("CMD-20260313-0042"), day(14)),
            "CMD-20260314-0001"
        );
    }

    #[test]
    fn test_garbage_restarts() {
        assert_eq!(next_order_number(Some("legacy-17"), day(14)), "CMD-20260314-0001");
        assert_eq!(next_order_number(Some("CMD-20260314-x1"), day(14)), "CMD-20260314-0001");
        assert_eq!(next_order_number(Some("FAC-20260314-0005"), day(14)), "CMD-20260314-0001");
    }

    #[test]
    fn test_sequence_past_four_digits() {
        assert_eq!(
            next_order_number(Some("CMD-20260314-9999"), day(14)),
            "CMD-20260314-10000"
        );
    }

    #[test]
    fn test_invoice_number_uses_global_count() {
        assert_eq!(next_invoice_number(0, day(14)), "FAC-20260314-0001");
        assert_eq!(next_invoice_number(41, day(15)), "FAC-20260315-0042");
    }

    #[test]
    fn test_parse_round_trip() {
        let parsed = parse_number("FAC-20260314-0042").unwrap();
        assert_eq!(parsed.prefix, "FAC");
        assert_eq!(parsed.date, day(14));
        assert_eq!(parsed.sequence, 42);

        assert!(parse_number("FAC-2026031-0042").is_none());
        assert!(parse_number("FAC-20261314-0042").is_none());
        assert!(parse_number("FAC-20260314").is_none());
    }
}
