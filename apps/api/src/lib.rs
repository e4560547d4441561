//! # facture-api: HTTP Surface for Facture
//!
//! axum router over the facture-db services, JSON error mapping and
//! invoice PDF export.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Request Path                                     │
//! │                                                                         │
//! │  HTTP request                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  routes/*.rs ── extract State / Path / Query / Json                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Services (facture-db) ── one transaction per mutation                  │
//! │       │                                                                 │
//! │       ├──► Ok(domain value) ──► dto.rs ──► camelCase JSON               │
//! │       └──► Err(ServiceError) ──► error.rs ──► {code, message} + status  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The binary in `main.rs` only loads configuration, opens the database and
//! serves [`build_router`]; tests drive the same router in-process.

pub mod config;
pub mod dto;
pub mod error;
pub mod pdf;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;

pub use config::{ApiConfig, CompanyInfo, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Assembles every route over the shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::categories::routes())
        .merge(routes::products::routes())
        .merge(routes::clients::routes())
        .merge(routes::orders::routes())
        .merge(routes::invoices::routes())
        .with_state(state)
}
