//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Seller details printed at the top of every invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        CompanyInfo {
            name: "Facture".to_string(),
            address: None,
            email: None,
            phone: None,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Default tracing filter when RUST_LOG is not set
    pub log_filter: String,

    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,

    /// ISO currency code shown on documents
    pub currency: String,

    pub company: CompanyInfo,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            host: env::var("FACTURE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: env::var("FACTURE_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("FACTURE_PORT".to_string()))?,

            database_path: env::var("FACTURE_DATABASE_PATH")
                .unwrap_or_else(|_| "./data/facture.db".to_string())
                .into(),

            db_max_connections: env::var("FACTURE_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("FACTURE_DB_MAX_CONNECTIONS".to_string()))?,

            log_filter: env::var("FACTURE_LOG").unwrap_or_else(|_| "info".to_string()),

            log_json: env::var("FACTURE_LOG_JSON")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("FACTURE_LOG_JSON".to_string()))?,

            currency: env::var("FACTURE_CURRENCY").unwrap_or_else(|_| "EUR".to_string()),

            company: CompanyInfo {
                name: env::var("FACTURE_COMPANY_NAME").unwrap_or_else(|_| "Facture".to_string()),
                address: env::var("FACTURE_COMPANY_ADDRESS").ok(),
                email: env::var("FACTURE_COMPANY_EMAIL").ok(),
                phone: env::var("FACTURE_COMPANY_PHONE").ok(),
            },
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("FACTURE_DB_MAX_CONNECTIONS".to_string()));
        }
        if config.company.name.trim().is_empty() {
            return Err(ConfigError::MissingRequired("FACTURE_COMPANY_NAME".to_string()));
        }

        Ok(config)
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_path: PathBuf::from(":memory:"),
            db_max_connections: 1,
            log_filter: "debug".to_string(),
            log_json: false,
            currency: "EUR".to_string(),
            company: CompanyInfo::default(),
        };
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }
}
