//! # Product Endpoints
//!
//! Catalog listing with filters, CRUD, availability, stock and sales
//! figures.
//!
//! ## Listing Filters
//! ```text
//! GET /api/products?q=&categoryId=&minPriceCents=&maxPriceCents=&available=
//!
//!   first filter present picks the query:   q ─► categoryId ─► price ─► available
//!   remaining filters narrow that result in memory
//! ```
//!
//! ## Reports
//! ```text
//! GET /api/products/recent?days=30        created in the last N days
//! GET /api/products/best-sellers?limit=10 ranked by units ordered
//! GET /api/products/top-revenue?limit=10  ranked by HT revenue of PAID orders
//! GET /api/products/{id}/sales            orders, units, revenue of one product
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use tracing::debug;

use crate::dto::{
    self, AvailabilityRequest, ProductDto, ProductQuery, ReportQuery, StockOperation, StockRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;
use facture_core::validation::validate_price_range;
use facture_db::{ProductInput, ProductSales, ProductStats};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/low-stock", get(low_stock))
        .route("/api/products/out-of-stock", get(out_of_stock))
        .route("/api/products/stats", get(stats))
        .route("/api/products/recent", get(recent))
        .route("/api/products/best-sellers", get(best_sellers))
        .route("/api/products/top-revenue", get(top_revenue))
        .route("/api/products/{id}", get(show).put(update).delete(remove))
        .route("/api/products/{id}/availability", patch(set_availability))
        .route("/api/products/{id}/stock", patch(adjust_stock))
        .route("/api/products/{id}/sales", get(sales))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<ProductDto>>> {
    let catalog = &state.services.catalog;
    validate_price_range(query.min_price_cents, query.max_price_cents)?;

    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let has_price = query.min_price_cents.is_some() || query.max_price_cents.is_some();

    let mut products = if let Some(q) = search {
        catalog.search_products(q).await?
    } else if let Some(category_id) = &query.category_id {
        if query.available == Some(true) {
            catalog.available_products_by_category(category_id).await?
        } else {
            catalog.products_by_category(category_id).await?
        }
    } else if has_price {
        catalog
            .products_by_price(query.min_price_cents, query.max_price_cents)
            .await?
    } else if query.available == Some(true) {
        catalog.list_available_products().await?
    } else {
        catalog.list_products().await?
    };

    if let Some(category_id) = &query.category_id {
        products.retain(|p| p.category_id.as_deref() == Some(category_id.as_str()));
    }
    if let Some(min) = query.min_price_cents {
        products.retain(|p| p.price_cents >= min);
    }
    if let Some(max) = query.max_price_cents {
        products.retain(|p| p.price_cents <= max);
    }
    if let Some(available) = query.available {
        products.retain(|p| p.is_available == available);
    }

    debug!(count = products.len(), "Products listed");
    Ok(Json(dto::list(products)))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<ProductDto>)> {
    let product = state.services.catalog.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ProductDto>> {
    Ok(Json(state.services.catalog.get_product(&id).await?.into()))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<ProductDto>> {
    Ok(Json(state.services.catalog.update_product(&id, input).await?.into()))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.services.catalog.delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AvailabilityRequest>,
) -> ApiResult<Json<ProductDto>> {
    let product = state
        .services
        .catalog
        .set_product_availability(&id, body.available)
        .await?;
    Ok(Json(product.into()))
}

/// `set`, `increase` or `reduce`. Reducing below zero answers 409.
async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StockRequest>,
) -> ApiResult<Json<ProductDto>> {
    let catalog = &state.services.catalog;
    let product = match body.operation {
        StockOperation::Set => catalog.set_stock(&id, body.quantity).await?,
        StockOperation::Increase => catalog.increase_stock(&id, body.quantity).await?,
        StockOperation::Reduce => catalog.reduce_stock(&id, body.quantity).await?,
    };
    Ok(Json(product.into()))
}

async fn low_stock(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductDto>>> {
    Ok(Json(dto::list(state.services.catalog.low_stock_products().await?)))
}

async fn out_of_stock(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductDto>>> {
    Ok(Json(dto::list(state.services.catalog.out_of_stock_products().await?)))
}

async fn stats(State(state): State<AppState>) -> ApiResult<Json<ProductStats>> {
    Ok(Json(state.services.catalog.product_stats().await?))
}

async fn recent(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Vec<ProductDto>>> {
    Ok(Json(dto::list(state.services.catalog.recent_products(query.days()).await?)))
}

async fn best_sellers(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Vec<ProductSales>>> {
    Ok(Json(state.services.catalog.best_selling_products(query.limit()).await?))
}

async fn top_revenue(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Vec<ProductSales>>> {
    Ok(Json(state.services.catalog.products_by_revenue(query.limit()).await?))
}

async fn sales(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ProductSales>> {
    Ok(Json(state.services.catalog.product_sales(&id).await?))
}
