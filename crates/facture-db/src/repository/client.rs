//! # Client Repository
//!
//! Database operations for the client registry.

use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use super::contains_pattern;
use crate::error::{DbError, DbResult};
use facture_core::Client;

/// Looks up a client on any executor (pool or open transaction).
pub async fn find_by_id<'e>(ex: impl SqliteExecutor<'e>, id: &str) -> DbResult<Option<Client>> {
    let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = ?1")
        .bind(id)
        .fetch_optional(ex)
        .await?;
    Ok(client)
}

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Gets a client by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        find_by_id(&self.pool, id).await
    }

    /// Gets a client by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE email = ?1 COLLATE NOCASE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    /// All clients sorted by last name, then first name.
    pub async fn list_all(&self) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients ORDER BY last_name, first_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    /// Substring search over first name, last name and email.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Client>> {
        debug!(query = %query, "Searching clients");

        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE last_name LIKE ?1 ESCAPE '\'
               OR first_name LIKE ?1 ESCAPE '\'
               OR email LIKE ?1 ESCAPE '\'
            ORDER BY last_name, first_name
            "#,
        )
        .bind(contains_pattern(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Most recently registered clients first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    /// True if another client already uses `email` (case-insensitive).
    pub async fn email_exists(&self, email: &str, exclude_id: Option<&str>) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM clients WHERE email = ?1 COLLATE NOCASE AND id != COALESCE(?2, '')",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Inserts a new client.
    pub async fn insert(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, email, last_name, first_name, phone, address,
                role, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&client.id)
        .bind(&client.email)
        .bind(&client.last_name)
        .bind(&client.first_name)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(client.role)
        .bind(client.is_active)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates contact details, role and active flag.
    pub async fn update(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, "Updating client");

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                email = ?2,
                last_name = ?3,
                first_name = ?4,
                phone = ?5,
                address = ?6,
                role = ?7,
                is_active = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&client.id)
        .bind(&client.email)
        .bind(&client.last_name)
        .bind(&client.first_name)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(client.role)
        .bind(client.is_active)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", &client.id));
        }

        Ok(())
    }

    /// Activates or deactivates the account.
    pub async fn set_active(&self, id: &str, active: bool, now: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query("UPDATE clients SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        Ok(())
    }

    /// Deletes a client. Callers check [`Self::count_orders`] first.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        Ok(())
    }

    /// Number of orders owned by the client.
    pub async fn count_orders(&self, id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE client_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Counts all clients.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
