//! # Services
//!
//! Business operations that span several repositories.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  Service  ── validates input (facture_core::validation)                 │
//! │      │      opens one transaction per mutation                          │
//! │      │      applies core rules (totals, transitions, invoice sync)      │
//! │      ▼                                                                  │
//! │  Repository free functions on `&mut *tx`                                │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A mutation either commits the order, its lines and its invoice together
//! or leaves all three untouched. Services never use the pool while a
//! transaction is open.

pub mod catalog;
pub mod clients;
pub mod invoices;
pub mod orders;

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::error::DbError;
use crate::pool::Database;
use facture_core::{Clock, CoreError, ValidationError};

pub use catalog::{CatalogService, CategoryInput, ProductInput};
pub use clients::{ClientInput, ClientService};
pub use invoices::{InvoiceDocument, InvoiceService};
pub use orders::{LineRequest, NewOrder, OrderService};

// =============================================================================
// Service Error
// =============================================================================

/// Failure of a service call: a business rule or the storage underneath.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Db(DbError::from(err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Fresh record identifier.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Service Bundle
// =============================================================================

/// Every service sharing one database and one clock.
#[derive(Debug, Clone)]
pub struct Services {
    pub catalog: CatalogService,
    pub clients: ClientService,
    pub orders: OrderService,
    pub invoices: InvoiceService,
}

impl Services {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Services {
            catalog: CatalogService::new(db.clone(), clock.clone()),
            clients: ClientService::new(db.clone(), clock.clone()),
            orders: OrderService::new(db.clone(), clock.clone()),
            invoices: InvoiceService::new(db, clock),
        }
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::pool::DbConfig;
    use chrono::{TimeZone, Utc};
    use facture_core::{Client, FixedClock, Product};

    pub struct Harness {
        pub services: Services,
        pub clock: Arc<FixedClock>,
        pub db: Database,
    }

    /// In-memory database, migrated, with the clock at 2026-03-14 09:00 UTC.
    pub async fn harness() -> Harness {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
        ));
        let services = Services::new(db.clone(), clock.clone());
        Harness { services, clock, db }
    }

    pub async fn client(h: &Harness, email: &str) -> Client {
        h.services
            .clients
            .create_client(ClientInput {
                email: email.to_string(),
                last_name: "Martin".to_string(),
                first_name: "Alice".to_string(),
                phone: None,
                address: Some("12 rue des Lilas, Lyon".to_string()),
                role: None,
            })
            .await
            .unwrap()
    }

    pub async fn product(h: &Harness, name: &str, price_cents: i64) -> Product {
        h.services
            .catalog
            .create_product(ProductInput {
                category_id: None,
                name: name.to_string(),
                description: None,
                price_cents,
                stock_quantity: 10,
                low_stock_threshold: 2,
                is_available: true,
            })
            .await
            .unwrap()
    }
}
