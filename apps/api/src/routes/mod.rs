//! # HTTP Routes
//!
//! One module per resource; each returns a `Router<AppState>` that
//! [`crate::build_router`] merges.
//!
//! ## Route Organization
//! ```text
//! routes/
//! ├── mod.rs         ◄─── You are here (exports)
//! ├── health.rs      ◄─── Liveness and database check
//! ├── categories.rs  ◄─── Category CRUD
//! ├── products.rs    ◄─── Products, stock, availability
//! ├── clients.rs     ◄─── Clients, their orders and invoices
//! ├── orders.rs      ◄─── Order aggregate and lines
//! └── invoices.rs    ◄─── Invoice queries, payment, PDF
//! ```
//!
//! ## Handler Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  async fn handler(                                                      │
//! │      State(state): State<AppState>,   ◄── services, company, currency   │
//! │      Path(id): Path<String>,          ◄── from /{id}                    │
//! │      Json(body): Json<Request>,       ◄── camelCase body                │
//! │  ) -> ApiResult<Json<Dto>>                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ServiceError ──► ApiError ──► { "code": ..., "message": ... }          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Literal segments such as `/low-stock` sit next to `/{id}`; the router
//! matches literals first.

pub mod categories;
pub mod clients;
pub mod health;
pub mod invoices;
pub mod orders;
pub mod products;
