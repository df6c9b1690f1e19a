//! Resource store.
//!
//! Resolves API and identity resource definitions by name or by requested
//! scope set, used to validate and enrich token contents.

use keystone_store::{Collection, Predicate, StoreResult};

use crate::types::{ApiResource, IdentityResource};

/// Storage operations for API and identity resources.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    api_resources: Collection<ApiResource>,
    identity_resources: Collection<IdentityResource>,
}

impl ResourceStore {
    /// Creates a store over the given resource collections.
    #[must_use]
    pub fn new(
        api_resources: Collection<ApiResource>,
        identity_resources: Collection<IdentityResource>,
    ) -> Self {
        Self {
            api_resources,
            identity_resources,
        }
    }

    /// Finds an API resource by its unique name.
    pub async fn find_api_resource_by_name(&self, name: &str) -> StoreResult<Option<ApiResource>> {
        self.api_resources
            .single_opt(&Predicate::field("name").eq(name))
            .await
    }

    /// Finds every API resource exposing at least one of the requested
    /// scopes.
    ///
    /// Each matching resource appears exactly once, in no particular order.
    /// An empty scope set yields an empty result, never the whole
    /// collection.
    pub async fn find_api_resources_by_scope(
        &self,
        scope_names: &[&str],
    ) -> StoreResult<Vec<ApiResource>> {
        if scope_names.is_empty() {
            return Ok(Vec::new());
        }
        self.api_resources
            .find(&Predicate::field("scopes").any_of(scope_names.iter().copied()))
            .await
    }

    /// Finds every identity resource whose name is one of the requested
    /// scopes.
    ///
    /// An empty scope set yields an empty result.
    pub async fn find_identity_resources_by_scope(
        &self,
        scope_names: &[&str],
    ) -> StoreResult<Vec<IdentityResource>> {
        if scope_names.is_empty() {
            return Ok(Vec::new());
        }
        self.identity_resources
            .find(&Predicate::field("name").is_in(scope_names.iter().copied()))
            .await
    }

    /// Registers a new API resource.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the name is already taken.
    pub async fn create_api_resource(&self, resource: &ApiResource) -> StoreResult<()> {
        self.api_resources.insert(resource).await
    }

    /// Registers a new identity resource.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the name is already taken.
    pub async fn create_identity_resource(&self, resource: &IdentityResource) -> StoreResult<()> {
        self.identity_resources.insert(resource).await
    }
}
