//! Shared application state.

use std::sync::Arc;

use crate::config::CompanyInfo;
use facture_core::Clock;
use facture_db::{Database, Services};

/// State handed to every handler. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub services: Services,
    pub clock: Arc<dyn Clock>,
    pub company: Arc<CompanyInfo>,
    pub currency: Arc<str>,
}

impl AppState {
    pub fn new(db: Database, clock: Arc<dyn Clock>, company: CompanyInfo, currency: &str) -> Self {
        AppState {
            services: Services::new(db.clone(), clock.clone()),
            db,
            clock,
            company: Arc::new(company),
            currency: Arc::from(currency),
        }
    }
}
