//! # Data Transfer Objects
//!
//! camelCase shapes for the JSON API. Domain types stay snake_case inside
//! the crates; every response goes through a `From` conversion here.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use facture_core::{
    Category, Client, Invoice, InvoiceStatus, Order, OrderDetails, OrderLine, OrderStatus,
    PaymentMethod, Product, UserRole, ValidationError,
};

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryDto {
    fn from(c: Category) -> Self {
        CategoryDto {
            id: c.id,
            name: c.name,
            description: c.description,
            is_active: c.is_active,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub category_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub low_stock_threshold: i64,
    pub is_available: bool,
    /// In stock but at or below the threshold.
    pub low_stock: bool,
    pub out_of_stock: bool,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        let low_stock = p.is_low_stock();
        let out_of_stock = p.is_out_of_stock();
        ProductDto {
            id: p.id,
            category_id: p.category_id,
            name: p.name,
            description: p.description,
            price_cents: p.price_cents,
            stock_quantity: p.stock_quantity,
            low_stock_threshold: p.low_stock_threshold,
            is_available: p.is_available,
            low_stock,
            out_of_stock,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDto {
    pub id: String,
    pub email: String,
    pub last_name: String,
    pub first_name: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Client> for ClientDto {
    fn from(c: Client) -> Self {
        let full_name = c.full_name();
        ClientDto {
            id: c.id,
            email: c.email,
            last_name: c.last_name,
            first_name: c.first_name,
            full_name,
            phone: c.phone,
            address: c.address,
            role: c.role,
            is_active: c.is_active,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: String,
    pub order_number: String,
    pub client_id: String,
    pub status: OrderStatus,
    pub tax_rate_bps: u32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderDto {
    fn from(o: Order) -> Self {
        OrderDto {
            id: o.id,
            order_number: o.order_number,
            client_id: o.client_id,
            status: o.status,
            tax_rate_bps: o.tax_rate_bps,
            subtotal_cents: o.subtotal_cents,
            tax_cents: o.tax_cents,
            total_cents: o.total_cents,
            comment: o.comment,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDto {
    pub id: String,
    pub product_id: String,
    pub position: i64,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub subtotal_cents: i64,
}

impl From<OrderLine> for OrderLineDto {
    fn from(l: OrderLine) -> Self {
        OrderLineDto {
            id: l.id,
            product_id: l.product_id,
            position: l.position,
            product_name: l.product_name,
            unit_price_cents: l.unit_price_cents,
            quantity: l.quantity,
            subtotal_cents: l.subtotal_cents,
        }
    }
}

/// An order with its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailsDto {
    #[serde(flatten)]
    pub order: OrderDto,
    pub lines: Vec<OrderLineDto>,
}

impl From<OrderDetails> for OrderDetailsDto {
    fn from(d: OrderDetails) -> Self {
        OrderDetailsDto {
            order: d.order.into(),
            lines: d.lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
    pub id: String,
    pub invoice_number: String,
    pub order_id: String,
    pub client_name: String,
    pub status: InvoiceStatus,
    pub payment_method: Option<PaymentMethod>,
    pub order_status: OrderStatus,
    pub tax_rate_bps: u32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub comment: Option<String>,
    pub invoice_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<Invoice> for InvoiceDto {
    fn from(i: Invoice) -> Self {
        InvoiceDto {
            id: i.id,
            invoice_number: i.invoice_number,
            order_id: i.order_id,
            client_name: i.client_name,
            status: i.status,
            payment_method: i.payment_method,
            order_status: i.order_status,
            tax_rate_bps: i.tax_rate_bps,
            subtotal_cents: i.subtotal_cents,
            tax_cents: i.tax_cents,
            total_cents: i.total_cents,
            comment: i.comment,
            invoice_date: i.invoice_date,
            paid_at: i.paid_at,
        }
    }
}

/// Entry of a reference list (statuses, payment methods).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeLabelDto {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueDto {
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountDto {
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailExistsDto {
    pub email: String,
    pub exists: bool,
}

/// Converts a list of domain values into their DTOs.
pub fn list<T, D: From<T>>(items: Vec<T>) -> Vec<D> {
    items.into_iter().map(D::from).collect()
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub available: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockOperation {
    Set,
    Increase,
    Reduce,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRequest {
    pub operation: StockOperation,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRequest {
    pub active: bool,
}

/// Status codes are accepted in any case (`PAID`, `paid`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodRequest {
    pub payment_method: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRateRequest {
    pub tax_rate_bps: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityRequest {
    pub quantity: i64,
}

// =============================================================================
// Query Strings
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category_id: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub available: Option<bool>,
}

/// Window of a sales or recency report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    /// Rows in a ranking; 10 when absent.
    pub limit: Option<u32>,
    /// Look-back in days; 30 when absent.
    pub days: Option<u32>,
}

impl ReportQuery {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10)
    }

    pub fn days(&self) -> u32 {
        self.days.unwrap_or(30)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientQuery {
    pub q: Option<String>,
    /// Newest first, at most this many.
    pub recent: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub status: Option<String>,
    pub client_id: Option<String>,
    #[serde(default)]
    pub today: bool,
}

/// Dates are `YYYY-MM-DD`; both bounds are inclusive whole days.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceQuery {
    pub status: Option<String>,
    pub client_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

// =============================================================================
// Parsing Helpers
// =============================================================================

/// Parses an optional `FromStr` value, treating blank input as absent.
pub fn parse_optional<T>(raw: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Ok(Some(s.parse::<T>()?)),
        None => Ok(None),
    }
}

fn parse_day(field: &str, raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected YYYY-MM-DD".to_string(),
    })
}

/// Start of the `from` day.
pub fn day_start(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match raw.filter(|s| !s.trim().is_empty()) {
        Some(raw) => Ok(Some(parse_day("from", raw)?.and_time(NaiveTime::MIN).and_utc())),
        None => Ok(None),
    }
}

/// Last instant of the `to` day.
pub fn day_end(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match raw.filter(|s| !s.trim().is_empty()) {
        Some(raw) => {
            let end = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
            Ok(Some(parse_day("to", raw)?.and_time(end).and_utc()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_bounds() {
        let start = day_start(Some("2026-03-01")).unwrap().unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());

        let end = day_end(Some("2026-03-31")).unwrap().unwrap();
        assert!(end > Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap());
        assert!(end < Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());

        assert!(day_start(Some("01/03/2026")).is_err());
        assert_eq!(day_end(Some("  ")).unwrap(), None);
    }

    #[test]
    fn test_parse_optional_status() {
        let status: Option<OrderStatus> = parse_optional(Some("paid")).unwrap();
        assert_eq!(status, Some(OrderStatus::Paid));

        let none: Option<OrderStatus> = parse_optional(Some("")).unwrap();
        assert_eq!(none, None);

        assert!(parse_optional::<OrderStatus>(Some("shipped")).is_err());
    }
}
