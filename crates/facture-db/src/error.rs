//! # Database Error Types
//!
//! What can go wrong below the services: missing rows, constraints the
//! schema enforces, and the pool or migrations failing.
//!
//! ## Constraint Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite says                              DbError                       │
//! │  ───────────────────────────────────────  ─────────────────────────     │
//! │  UNIQUE constraint failed: products.name  UniqueViolation{products,name}│
//! │  CHECK constraint failed: price_cents > 0 CheckViolation                │
//! │  NOT NULL constraint failed: ...          CheckViolation                │
//! │  FOREIGN KEY constraint failed            ForeignKeyViolation           │
//! │  pool timed out / closed                  PoolExhausted / Connection... │
//! │  anything else from the engine            QueryFailed                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The services check names, emails and references before writing, so a
//! constraint error here means two requests raced on the same row.

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `UPDATE ... WHERE id = ?` touched no row
    /// - `fetch_one` returned no rows
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write.
    ///
    /// ## When This Occurs
    /// - Product or category name taken (case-insensitive)
    /// - Client email taken
    /// - Two orders or invoices numbered the same way concurrently
    #[error("{column} is already used by another {table} record")]
    UniqueViolation { table: String, column: String },

    /// A CHECK or NOT NULL constraint rejected a value, such as a negative
    /// stock level or an unknown status string.
    #[error("Constraint failed: {constraint}")]
    CheckViolation { constraint: String },

    /// A referenced category, client, product or order is missing, or a
    /// referenced row was about to be deleted.
    #[error("Referenced record does not exist or is still in use")]
    ForeignKeyViolation,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// The engine refused the statement for any other reason.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Splits `"UNIQUE constraint failed: order_lines.order_id, order_lines.product_id"`
/// into `("order_lines", "order_id, product_id")`.
fn unique_target(message: &str) -> (String, String) {
    let columns = message
        .split_once(": ")
        .map(|(_, columns)| columns)
        .unwrap_or(message);

    let mut table = String::new();
    let mut names = Vec::new();
    for qualified in columns.split(',').map(str::trim) {
        match qualified.split_once('.') {
            Some((t, column)) => {
                if table.is_empty() {
                    table = t.to_string();
                }
                names.push(column);
            }
            None => names.push(qualified),
        }
    }

    if table.is_empty() {
        table.push_str("existing");
    }
    (table, names.join(", "))
}

/// Strips the `"CHECK constraint failed: "` style prefix.
fn constraint_detail(message: &str) -> String {
    message
        .split_once(": ")
        .map(|(_, detail)| detail)
        .unwrap_or(message)
        .to_string()
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → by ErrorKind (unique, check, foreign key)
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        let (table, column) = unique_target(message);
                        DbError::UniqueViolation { table, column }
                    }
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation,
                    ErrorKind::CheckViolation | ErrorKind::NotNullViolation => DbError::CheckViolation {
                        constraint: constraint_detail(message),
                    },
                    _ => DbError::QueryFailed(message.to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[test]
    fn test_unique_target() {
        assert_eq!(
            unique_target("UNIQUE constraint failed: products.name"),
            ("products".to_string(), "name".to_string())
        );
        assert_eq!(
            unique_target("UNIQUE constraint failed: order_lines.order_id, order_lines.product_id"),
            ("order_lines".to_string(), "order_id, product_id".to_string())
        );
    }

    #[tokio::test]
    async fn test_constraint_errors_from_sqlite() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let insert = "INSERT INTO categories (id, name, is_active, created_at, updated_at) \
                      VALUES (?1, ?2, 1, '2026-03-14T09:00:00Z', '2026-03-14T09:00:00Z')";

        sqlx::query(insert).bind("c-1").bind("Bureau").execute(db.pool()).await.unwrap();
        let err: DbError = sqlx::query(insert)
            .bind("c-2")
            .bind("BUREAU")
            .execute(db.pool())
            .await
            .unwrap_err()
            .into();
        assert!(matches!(
            &err,
            DbError::UniqueViolation { table, column } if table == "categories" && column == "name"
        ));

        let err: DbError = sqlx::query(
            "INSERT INTO products (id, category_id, name, price_cents, created_at, updated_at) \
             VALUES ('p-1', 'missing', 'Lampe', 100, '2026-03-14T09:00:00Z', '2026-03-14T09:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap_err()
        .into();
        assert!(matches!(err, DbError::ForeignKeyViolation));

        let err: DbError = sqlx::query(
            "INSERT INTO products (id, name, price_cents, created_at, updated_at) \
             VALUES ('p-2', 'Lampe', 0, '2026-03-14T09:00:00Z', '2026-03-14T09:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap_err()
        .into();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
