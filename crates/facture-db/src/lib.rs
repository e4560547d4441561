//! # facture-db: Database Layer for Facture
//!
//! SQLite storage and the transactional services built on it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Facture Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /api/orders)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     facture-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │   │
//! │  │   │   Services    │    │  Repositories │    │  Migrations  │    │   │
//! │  │   │ (service/)    │───►│ (repository/) │    │  (embedded)  │    │   │
//! │  │   │               │    │               │    │              │    │   │
//! │  │   │ OrderService  │    │ OrderRepo     │    │ 0001_initial │    │   │
//! │  │   │ InvoiceSvc    │    │ InvoiceRepo   │    │              │    │   │
//! │  │   │ Catalog, ...  │    │ ProductRepo   │    │              │    │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │   │
//! │  │            │                    │                               │   │
//! │  │            ▼                    ▼                               │   │
//! │  │   ┌─────────────────────────────────────┐                      │   │
//! │  │   │   Database (pool.rs) - SqlitePool   │                      │   │
//! │  │   └─────────────────────────────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (./data/facture.db)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table queries
//! - [`service`] - Business operations, one transaction per mutation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use facture_core::SystemClock;
//! use facture_db::{Database, DbConfig, Services};
//!
//! let db = Database::new(DbConfig::new("./data/facture.db")).await?;
//! let services = Services::new(db, Arc::new(SystemClock));
//!
//! let details = services.orders.create_order(&client_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::client::ClientRepository;
pub use repository::invoice::{InvoiceFilter, InvoiceRepository, InvoiceStats};
pub use repository::order::{OrderFilter, OrderRepository};
pub use repository::product::{ProductRepository, ProductStats};
pub use repository::sales::{ProductSales, SalesRepository};

pub use service::{
    CatalogService, CategoryInput, ClientInput, ClientService, InvoiceDocument, InvoiceService,
    LineRequest, NewOrder, OrderService, ProductInput, ServiceError, ServiceResult, Services,
};
