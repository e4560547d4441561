//! # Order Endpoints
//!
//! Every mutation answers with the full order and its lines, so the caller
//! always sees the recomputed totals.
//!
//! ## Order Lifecycle over HTTP
//! ```text
//! POST /api/orders ──────────────► PENDING (invoice FAC-... issued)
//!   │  POST   /{id}/lines            add or merge a product
//!   │  PUT    /{id}/lines/{product}  set quantity (0 removes)
//!   │  DELETE /{id}/lines/{product}  remove
//!   │  PATCH  /{id}/tax-rate         PENDING only
//!   ▼
//! POST  /{id}/validate ─────────────────► PAID (lines checked)
//! PATCH /{id}/status {"status":"PAID"} ──► PAID ──► DELIVERED
//! POST  /{id}/cancel ─────────────────────► CANCELLED
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use tracing::debug;

use crate::dto::{
    self, parse_optional, CommentRequest, InvoiceDto, OrderDetailsDto, OrderDto, OrderQuery,
    PaymentMethodRequest, QuantityRequest, RevenueDto, StatusRequest, TaxRateRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;
use facture_core::{OrderStatus, PaymentMethod};
use facture_db::{LineRequest, NewOrder, OrderFilter};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list).post(create))
        .route("/api/orders/revenue", get(revenue))
        .route("/api/orders/number/{number}", get(by_number))
        .route("/api/orders/{id}", get(show))
        .route("/api/orders/{id}/status", patch(change_status))
        .route("/api/orders/{id}/payment-method", patch(change_payment_method))
        .route("/api/orders/{id}/tax-rate", patch(update_tax_rate))
        .route("/api/orders/{id}/comment", patch(update_comment))
        .route("/api/orders/{id}/validate", post(validate))
        .route("/api/orders/{id}/cancel", post(cancel))
        .route("/api/orders/{id}/lines", post(add_line))
        .route(
            "/api/orders/{id}/lines/{product_id}",
            put(set_line_quantity).delete(remove_line),
        )
}

/// `?today=true` wins over the other filters.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Json<Vec<OrderDto>>> {
    let orders = &state.services.orders;
    if query.today {
        return Ok(Json(dto::list(orders.todays_orders().await?)));
    }

    let filter = OrderFilter {
        status: parse_optional::<OrderStatus>(query.status.as_deref())?,
        client_id: query.client_id.filter(|id| !id.trim().is_empty()),
        ..OrderFilter::default()
    };
    let found = orders.list_orders(&filter).await?;
    debug!(count = found.len(), "Orders listed");
    Ok(Json(dto::list(found)))
}

async fn create(
    State(state): State<AppState>,
    Json(request): Json<NewOrder>,
) -> ApiResult<(StatusCode, Json<OrderDetailsDto>)> {
    let details = state.services.orders.create_order_with_lines(request).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

async fn revenue(State(state): State<AppState>) -> ApiResult<Json<RevenueDto>> {
    let revenue_cents = state.services.orders.revenue().await?;
    Ok(Json(RevenueDto { revenue_cents }))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<OrderDetailsDto>> {
    Ok(Json(state.services.orders.get_order(&id).await?.into()))
}

async fn by_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> ApiResult<Json<OrderDetailsDto>> {
    Ok(Json(state.services.orders.get_order_by_number(&number).await?.into()))
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> ApiResult<Json<OrderDetailsDto>> {
    let status: OrderStatus = body.status.parse()?;
    Ok(Json(state.services.orders.change_status(&id, status).await?.into()))
}

/// 200 with the invoice, or 204 while the order has no invoice yet.
async fn change_payment_method(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PaymentMethodRequest>,
) -> ApiResult<Response> {
    let method: PaymentMethod = body.payment_method.parse()?;
    let response = match state.services.orders.change_payment_method(&id, method).await? {
        Some(invoice) => Json(InvoiceDto::from(invoice)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}

async fn update_tax_rate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TaxRateRequest>,
) -> ApiResult<Json<OrderDetailsDto>> {
    let details = state.services.orders.update_tax_rate(&id, body.tax_rate_bps).await?;
    Ok(Json(details.into()))
}

async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<Json<OrderDetailsDto>> {
    let details = state.services.orders.update_comment(&id, body.comment).await?;
    Ok(Json(details.into()))
}

/// PENDING to PAID once the lines are checked.
async fn validate(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<OrderDetailsDto>> {
    Ok(Json(state.services.orders.validate_order(&id).await?.into()))
}

async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<OrderDetailsDto>> {
    Ok(Json(state.services.orders.cancel_order(&id).await?.into()))
}

async fn add_line(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(line): Json<LineRequest>,
) -> ApiResult<Json<OrderDetailsDto>> {
    let details = state
        .services
        .orders
        .add_line(&id, &line.product_id, line.quantity)
        .await?;
    Ok(Json(details.into()))
}

async fn set_line_quantity(
    State(state): State<AppState>,
    Path((id, product_id)): Path<(String, String)>,
    Json(body): Json<QuantityRequest>,
) -> ApiResult<Json<OrderDetailsDto>> {
    let details = state
        .services
        .orders
        .set_line_quantity(&id, &product_id, body.quantity)
        .await?;
    Ok(Json(details.into()))
}

async fn remove_line(
    State(state): State<AppState>,
    Path((id, product_id)): Path<(String, String)>,
) -> ApiResult<Json<OrderDetailsDto>> {
    Ok(Json(state.services.orders.remove_line(&id, &product_id).await?.into()))
}
