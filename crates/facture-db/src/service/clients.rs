//! # Client Service
//!
//! Client registry: contact details, unique email, activation.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::{new_id, ServiceResult};
use crate::pool::Database;
use facture_core::validation::{
    normalize_optional, validate_description, validate_email, validate_person_name,
    validate_search_query,
};
use facture_core::{Client, Clock, CoreError, UserRole, ValidationError};

/// Fields accepted when registering or editing a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    pub email: String,
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl ClientInput {
    /// Trims every field and runs the field validators.
    fn normalized(self) -> Result<ClientInput, ValidationError> {
        let input = ClientInput {
            email: self.email.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            phone: normalize_optional(self.phone),
            address: normalize_optional(self.address),
            role: self.role,
        };

        validate_email(&input.email)?;
        validate_person_name("last_name", &input.last_name)?;
        validate_person_name("first_name", &input.first_name)?;
        validate_description("address", input.address.as_deref())?;

        Ok(input)
    }
}

#[derive(Debug, Clone)]
pub struct ClientService {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl ClientService {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        ClientService { db, clock }
    }

    pub async fn list_clients(&self) -> ServiceResult<Vec<Client>> {
        Ok(self.db.clients().list_all().await?)
    }

    pub async fn get_client(&self, id: &str) -> ServiceResult<Client> {
        self.db
            .clients()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Client", id).into())
    }

    /// Looks a client up by email, ignoring case and surrounding blanks.
    pub async fn get_client_by_email(&self, email: &str) -> ServiceResult<Client> {
        let email = email.trim();
        self.db
            .clients()
            .get_by_email(email)
            .await?
            .ok_or_else(|| CoreError::not_found("Client", email).into())
    }

    pub async fn search_clients(&self, query: &str) -> ServiceResult<Vec<Client>> {
        let query = validate_search_query(query)?;
        Ok(self.db.clients().search(&query).await?)
    }

    pub async fn recent_clients(&self, limit: u32) -> ServiceResult<Vec<Client>> {
        Ok(self.db.clients().list_recent(limit).await?)
    }

    pub async fn count_clients(&self) -> ServiceResult<i64> {
        Ok(self.db.clients().count().await?)
    }

    /// True when the address is already registered (case-insensitive).
    pub async fn email_exists(&self, email: &str) -> ServiceResult<bool> {
        Ok(self.db.clients().email_exists(email.trim(), None).await?)
    }

    pub async fn create_client(&self, input: ClientInput) -> ServiceResult<Client> {
        let input = input.normalized()?;
        let repo = self.db.clients();

        if repo.email_exists(&input.email, None).await? {
            return Err(ValidationError::Duplicate {
                field: "email".to_string(),
                value: input.email,
            }
            .into());
        }

        let now = self.clock.now();
        let client = Client {
            id: new_id(),
            email: input.email,
            last_name: input.last_name,
            first_name: input.first_name,
            phone: input.phone,
            address: input.address,
            role: input.role.unwrap_or_default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        repo.insert(&client).await?;

        info!(id = %client.id, "Client registered");
        Ok(client)
    }

    /// Replaces contact details. The role is kept unless one is given.
    pub async fn update_client(&self, id: &str, input: ClientInput) -> ServiceResult<Client> {
        let mut client = self.get_client(id).await?;
        let input = input.normalized()?;
        let repo = self.db.clients();

        if repo.email_exists(&input.email, Some(id)).await? {
            return Err(ValidationError::Duplicate {
                field: "email".to_string(),
                value: input.email,
            }
            .into());
        }

        client.email = input.email;
        client.last_name = input.last_name;
        client.first_name = input.first_name;
        client.phone = input.phone;
        client.address = input.address;
        if let Some(role) = input.role {
            client.role = role;
        }
        client.updated_at = self.clock.now();
        repo.update(&client).await?;

        Ok(client)
    }

    pub async fn set_client_active(&self, id: &str, active: bool) -> ServiceResult<Client> {
        self.db.clients().set_active(id, active, self.clock.now()).await?;
        info!(id = %id, active = active, "Client activation changed");
        self.get_client(id).await
    }

    /// Deletes a client that never placed an order.
    pub async fn delete_client(&self, id: &str) -> ServiceResult<()> {
        let client = self.get_client(id).await?;
        let repo = self.db.clients();

        if repo.count_orders(id).await? > 0 {
            return Err(CoreError::still_referenced("Client", &client.full_name(), "orders").into());
        }

        repo.delete(id).await?;
        info!(id = %id, "Client deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fixtures::{client, harness};
    use crate::service::ServiceError;

    fn input(email: &str) -> ClientInput {
        ClientInput {
            email: email.to_string(),
            last_name: " Durand ".to_string(),
            first_name: "Paul".to_string(),
            phone: Some("".to_string()),
            address: None,
            role: None,
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_fields() {
        let h = harness().await;
        let created = h.services.clients.create_client(input(" paul@example.fr ")).await.unwrap();

        assert_eq!(created.email, "paul@example.fr");
        assert_eq!(created.last_name, "Durand");
        assert_eq!(created.phone, None);
        assert_eq!(created.role, UserRole::Client);
        assert!(created.is_active);
    }

    #[tokio::test]
    async fn test_email_is_unique_ignoring_case() {
        let h = harness().await;
        let clients = &h.services.clients;
        clients.create_client(input("paul@example.fr")).await.unwrap();

        assert!(clients.email_exists("PAUL@example.fr").await.unwrap());
        let found = clients.get_client_by_email(" PAUL@example.fr ").await.unwrap();
        assert_eq!(found.email, "paul@example.fr");
        let err = clients.get_client_by_email("nobody@example.fr").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::NotFound { .. })));
        let err = clients.create_client(input("Paul@Example.fr")).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_own_email() {
        let h = harness().await;
        let alice = client(&h, "alice@example.fr").await;

        let mut changes = input("alice@example.fr");
        changes.first_name = "Alicia".to_string();
        let updated = h.services.clients.update_client(&alice.id, changes).await.unwrap();

        assert_eq!(updated.first_name, "Alicia");
        assert_eq!(updated.full_name(), "Alicia Durand");
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let h = harness().await;
        assert!(h.services.clients.create_client(input("not-an-email")).await.is_err());
    }

    #[tokio::test]
    async fn test_search_and_deactivate() {
        let h = harness().await;
        let clients = &h.services.clients;
        let alice = client(&h, "alice@example.fr").await;
        clients.create_client(input("paul@example.fr")).await.unwrap();

        assert_eq!(clients.search_clients("durand").await.unwrap().len(), 1);
        assert_eq!(clients.search_clients("example").await.unwrap().len(), 2);
        assert_eq!(clients.count_clients().await.unwrap(), 2);

        let alice = clients.set_client_active(&alice.id, false).await.unwrap();
        assert!(!alice.is_active);

        clients.delete_client(&alice.id).await.unwrap();
        assert_eq!(clients.count_clients().await.unwrap(), 1);
    }
}
