//! Client store.
//!
//! Resolves a client identifier to its full registration. Sits on the
//! security-critical path of every authorization and token request.

use keystone_store::{Collection, Predicate, StoreError, StoreResult};
use tracing::debug;

use crate::types::Client;

/// Storage operations for OAuth 2.0 client registrations.
///
/// Lookups are exact-match against the unique client-identifier index;
/// identifiers are never substring- or case-insensitively matched. An
/// unknown identifier is an absent result, not an error, so the token
/// endpoint can answer uniformly for malformed and unregistered clients.
#[derive(Debug, Clone)]
pub struct ClientStore {
    clients: Collection<Client>,
}

impl ClientStore {
    /// Creates a store over the given client collection.
    #[must_use]
    pub fn new(clients: Collection<Client>) -> Self {
        Self { clients }
    }

    /// Finds a client by its OAuth client_id.
    ///
    /// Returns `None` if no such client is registered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AmbiguousResult`] if the unique-identifier
    /// invariant is violated in the backing data, and infrastructure errors
    /// as-is.
    pub async fn find_by_client_id(&self, client_id: &str) -> StoreResult<Option<Client>> {
        self.clients
            .single_opt(&Predicate::field("clientId").eq(client_id))
            .await
    }

    /// Registers a new client.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDocument`] if the registration fails
    /// validation and [`StoreError::DuplicateKey`] if the client_id is
    /// already taken.
    pub async fn create(&self, client: &Client) -> StoreResult<()> {
        client
            .validate()
            .map_err(|err| StoreError::invalid_document(err.to_string()))?;
        self.clients.insert(client).await?;
        debug!(client_id = %client.client_id, "client registered");
        Ok(())
    }

    /// Replaces an existing registration, addressed by its client_id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the client is not registered and
    /// [`StoreError::InvalidDocument`] if the replacement fails validation.
    pub async fn update(&self, client: &Client) -> StoreResult<()> {
        client
            .validate()
            .map_err(|err| StoreError::invalid_document(err.to_string()))?;
        let replaced = self
            .clients
            .replace(&Predicate::field("clientId").eq(client.client_id.as_str()), client)
            .await?;
        if replaced == 0 {
            return Err(StoreError::not_found(self.clients.name()));
        }
        Ok(())
    }

    /// De-registers a client. Idempotent; deleting an unknown client_id is
    /// not an error.
    pub async fn delete(&self, client_id: &str) -> StoreResult<()> {
        let removed = self
            .clients
            .remove(&Predicate::field("clientId").eq(client_id))
            .await?;
        if removed > 0 {
            debug!(client_id, "client de-registered");
        }
        Ok(())
    }
}
