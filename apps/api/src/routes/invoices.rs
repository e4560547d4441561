//! # Invoice Endpoints
//!
//! Invoices are never created or edited here; they follow their order.
//! The only direct write is recording a payment.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use tracing::{debug, error};

use crate::dto::{
    self, day_end, day_start, parse_optional, CodeLabelDto, InvoiceDto, InvoiceQuery,
    PaymentMethodRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::pdf;
use crate::state::AppState;
use facture_core::{InvoiceStatus, PaymentMethod};
use facture_db::{InvoiceFilter, InvoiceStats};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/invoices", get(list))
        .route("/api/invoices/unprocessed", get(unprocessed))
        .route("/api/invoices/paid-this-month", get(paid_this_month))
        .route("/api/invoices/stats", get(stats))
        .route("/api/invoices/statuses", get(statuses))
        .route("/api/invoices/payment-methods", get(payment_methods))
        .route("/api/invoices/number/{number}", get(by_number))
        .route("/api/invoices/{id}", get(show))
        .route("/api/invoices/{id}/pay", patch(pay))
        .route("/api/invoices/{id}/pdf", get(download_pdf))
}

/// `from` and `to` are inclusive calendar days (`YYYY-MM-DD`, UTC).
async fn list(
    State(state): State<AppState>,
    Query(query): Query<InvoiceQuery>,
) -> ApiResult<Json<Vec<InvoiceDto>>> {
    let filter = InvoiceFilter {
        status: parse_optional::<InvoiceStatus>(query.status.as_deref())?,
        client_id: query.client_id.filter(|id| !id.trim().is_empty()),
        from: day_start(query.from.as_deref())?,
        to: day_end(query.to.as_deref())?,
    };
    let invoices = state.services.invoices.filter(&filter).await?;
    debug!(count = invoices.len(), "Invoices listed");
    Ok(Json(dto::list(invoices)))
}

async fn unprocessed(State(state): State<AppState>) -> ApiResult<Json<Vec<InvoiceDto>>> {
    Ok(Json(dto::list(state.services.invoices.unprocessed().await?)))
}

async fn paid_this_month(State(state): State<AppState>) -> ApiResult<Json<Vec<InvoiceDto>>> {
    Ok(Json(dto::list(state.services.invoices.paid_this_month().await?)))
}

async fn stats(State(state): State<AppState>) -> ApiResult<Json<InvoiceStats>> {
    Ok(Json(state.services.invoices.stats().await?))
}

async fn statuses() -> Json<Vec<CodeLabelDto>> {
    Json(
        InvoiceStatus::ALL
            .iter()
            .map(|s| CodeLabelDto {
                code: s.code().to_string(),
                label: s.label().to_string(),
            })
            .collect(),
    )
}

async fn payment_methods() -> Json<Vec<CodeLabelDto>> {
    Json(
        PaymentMethod::ALL
            .iter()
            .map(|m| CodeLabelDto {
                code: m.code().to_string(),
                label: m.label().to_string(),
            })
            .collect(),
    )
}

async fn by_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> ApiResult<Json<InvoiceDto>> {
    Ok(Json(state.services.invoices.get_by_number(&number).await?.into()))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<InvoiceDto>> {
    Ok(Json(state.services.invoices.get_invoice(&id).await?.into()))
}

/// Records the payment. Paying twice, or paying a cancelled invoice, is a 400.
async fn pay(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PaymentMethodRequest>,
) -> ApiResult<Json<InvoiceDto>> {
    let method: PaymentMethod = body.payment_method.parse()?;
    Ok(Json(state.services.invoices.mark_paid(&id, method).await?.into()))
}

/// Streams the invoice as `{invoice_number}.pdf`.
///
/// Rendering runs on the blocking pool.
async fn download_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let document = state.services.invoices.document(&id).await?;
    let filename = format!("{}.pdf", document.invoice.invoice_number);

    let company = state.company.clone();
    let currency = state.currency.clone();
    let bytes = tokio::task::spawn_blocking(move || pdf::render_invoice(&document, &company, &currency))
        .await
        .map_err(|e| {
            error!("PDF rendering task failed: {}", e);
            ApiError::internal("Could not render the invoice document")
        })??;

    debug!(invoice = %filename, size = bytes.len(), "Invoice rendered");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}
