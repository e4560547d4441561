//! Client endpoints, including the per-client order and invoice views.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};

use crate::dto::{
    self, ActiveRequest, ClientDto, ClientQuery, CountDto, EmailExistsDto, EmailQuery, InvoiceDto,
    OrderDetailsDto, OrderDto,
};
use crate::error::ApiResult;
use crate::state::AppState;
use facture_db::ClientInput;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/clients", get(list).post(create))
        .route("/api/clients/count", get(count))
        .route("/api/clients/email-exists", get(email_exists))
        .route("/api/clients/by-email", get(by_email))
        .route("/api/clients/{id}", get(show).put(update).delete(remove))
        .route("/api/clients/{id}/active", patch(set_active))
        .route("/api/clients/{id}/orders", get(orders).post(create_order))
        .route("/api/clients/{id}/invoices", get(invoices))
}

/// `?q=` searches names and email, `?recent=N` returns the newest N.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ClientQuery>,
) -> ApiResult<Json<Vec<ClientDto>>> {
    let clients = &state.services.clients;
    let found = match (query.q.as_deref().map(str::trim), query.recent) {
        (Some(q), _) if !q.is_empty() => clients.search_clients(q).await?,
        (_, Some(limit)) => clients.recent_clients(limit).await?,
        _ => clients.list_clients().await?,
    };
    Ok(Json(dto::list(found)))
}

async fn count(State(state): State<AppState>) -> ApiResult<Json<CountDto>> {
    let count = state.services.clients.count_clients().await?;
    Ok(Json(CountDto { count }))
}

async fn email_exists(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<EmailExistsDto>> {
    let exists = state.services.clients.email_exists(&query.email).await?;
    Ok(Json(EmailExistsDto {
        email: query.email,
        exists,
    }))
}

async fn by_email(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<ClientDto>> {
    Ok(Json(state.services.clients.get_client_by_email(&query.email).await?.into()))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<ClientInput>,
) -> ApiResult<(StatusCode, Json<ClientDto>)> {
    let client = state.services.clients.create_client(input).await?;
    Ok((StatusCode::CREATED, Json(client.into())))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ClientDto>> {
    Ok(Json(state.services.clients.get_client(&id).await?.into()))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ClientInput>,
) -> ApiResult<Json<ClientDto>> {
    Ok(Json(state.services.clients.update_client(&id, input).await?.into()))
}

/// Refused while the client has orders; deactivate instead.
async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.services.clients.delete_client(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ActiveRequest>,
) -> ApiResult<Json<ClientDto>> {
    let client = state.services.clients.set_client_active(&id, body.active).await?;
    Ok(Json(client.into()))
}

async fn orders(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Vec<OrderDto>>> {
    Ok(Json(dto::list(state.services.orders.orders_by_client(&id).await?)))
}

/// Opens an empty PENDING order. Its invoice appears with the first line.
async fn create_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<OrderDetailsDto>)> {
    let details = state.services.orders.create_order(&id).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

async fn invoices(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Vec<InvoiceDto>>> {
    Ok(Json(dto::list(state.services.invoices.client_history(&id).await?)))
}
