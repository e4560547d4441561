//! Category endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::dto::{self, CategoryDto, ProductDto};
use crate::error::ApiResult;
use crate::state::AppState;
use facture_db::CategoryInput;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    #[serde(default)]
    pub active_only: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list).post(create))
        .route("/api/categories/{id}", get(show).put(update).delete(remove))
        .route("/api/categories/{id}/available-products", get(available_products))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Json<Vec<CategoryDto>>> {
    let categories = state.services.catalog.list_categories(query.active_only).await?;
    Ok(Json(dto::list(categories)))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<(StatusCode, Json<CategoryDto>)> {
    let category = state.services.catalog.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<CategoryDto>> {
    Ok(Json(state.services.catalog.get_category(&id).await?.into()))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Json<CategoryDto>> {
    Ok(Json(state.services.catalog.update_category(&id, input).await?.into()))
}

/// Refused while products still point at the category.
async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.services.catalog.delete_category(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Products of the category that can be ordered right now.
async fn available_products(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ProductDto>>> {
    let products = state.services.catalog.available_products_by_category(&id).await?;
    Ok(Json(dto::list(products)))
}
