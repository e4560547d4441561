//! # Repository Module
//!
//! Database repository implementations for Facture.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler / service                                                │
//! │       │                                                                 │
//! │       │  db.products().search("chair")                                 │
//! │       ▼                                                                 │
//! │  ProductRepository (holds a pool clone)                                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Inside a transaction the services call the free functions of each     │
//! │  module (`order::insert(&mut *tx, ..)`) instead: they accept any       │
//! │  SqliteExecutor, so the same SQL runs on the pool or on `&mut *tx`.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`](category::CategoryRepository) - Category CRUD
//! - [`ProductRepository`](product::ProductRepository) - Products, stock, search
//! - [`ClientRepository`](client::ClientRepository) - Client registry
//! - [`OrderRepository`](order::OrderRepository) - Orders and their lines
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoices, filters, stats
//! - [`SalesRepository`](sales::SalesRepository) - Per-product sales aggregates

pub mod category;
pub mod client;
pub mod invoice;
pub mod order;
pub mod product;
pub mod sales;

/// Builds a `LIKE` pattern matching `query` anywhere, with `\` as escape.
///
/// ## Example
/// ```text
/// "50%"   → "%50\%%"
/// "a_b"   → "%a\_b%"
/// ```
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("chair"), "%chair%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern(""), "%%");
    }
}
