//! Startup wiring: collection names, index provisioning, store handles.
//!
//! [`AuthStores::initialize`] is run once at process startup. It provisions
//! every collection and unique index idempotently, then hands out store
//! handles that are shared read-only for the lifetime of the process.

use tracing::info;

use keystone_store::{Collection, DynBackend, StoreResult};

use crate::stores::{ClientStore, PersistedGrantStore, ResourceStore, RoleStore, UserStore};
use crate::types::{ApiResource, Client, IdentityResource, PersistedGrant, Role, User};

/// Collection name for user accounts. Fixed by contract.
pub const USERS_COLLECTION: &str = "Users";

/// Collection name for roles. Fixed by contract.
pub const ROLES_COLLECTION: &str = "Roles";

/// Caller-chosen collection names for the protocol entities.
///
/// `Users` and `Roles` are fixed; everything else defaults to the
/// conventional names and may be overridden per deployment.
#[derive(Debug, Clone)]
pub struct CollectionNames {
    /// Collection holding client registrations.
    pub clients: String,
    /// Collection holding API resources.
    pub api_resources: String,
    /// Collection holding identity resources.
    pub identity_resources: String,
    /// Collection holding persisted grants.
    pub grants: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            clients: "Clients".into(),
            api_resources: "ApiResources".into(),
            identity_resources: "IdentityResources".into(),
            grants: "PersistedGrants".into(),
        }
    }
}

/// The five stores of the authorization server, wired to one backend.
#[derive(Debug, Clone)]
pub struct AuthStores {
    clients: ClientStore,
    resources: ResourceStore,
    grants: PersistedGrantStore,
    users: UserStore,
    roles: RoleStore,
}

impl AuthStores {
    /// Provisions collections and unique indexes, then constructs the
    /// stores.
    ///
    /// Index creation is idempotent and safe to run on every startup. The
    /// unique indexes are the enforcement point for every uniqueness
    /// invariant of the data model: client identifier, resource names,
    /// grant key, normalized username/email, normalized role name.
    ///
    /// # Errors
    ///
    /// Returns connection or backend errors from provisioning; a failure
    /// here is fatal at process level.
    pub async fn initialize(backend: DynBackend, names: CollectionNames) -> StoreResult<Self> {
        let unique_indexes: [(&str, &[&str]); 6] = [
            (names.clients.as_str(), &["clientId"]),
            (names.api_resources.as_str(), &["name"]),
            (names.identity_resources.as_str(), &["name"]),
            (names.grants.as_str(), &["key"]),
            (USERS_COLLECTION, &["normalizedUserName", "normalizedEmail"]),
            (ROLES_COLLECTION, &["normalizedName"]),
        ];

        for (collection, fields) in unique_indexes {
            backend.ensure_collection(collection).await?;
            for field in fields {
                backend.ensure_unique_index(collection, field).await?;
            }
        }

        info!(
            backend = backend.backend_name(),
            clients = %names.clients,
            grants = %names.grants,
            "auth store collections provisioned"
        );

        Ok(Self {
            clients: ClientStore::new(Collection::<Client>::named(
                backend.clone(),
                &names.clients,
            )),
            resources: ResourceStore::new(
                Collection::<ApiResource>::named(backend.clone(), &names.api_resources),
                Collection::<IdentityResource>::named(backend.clone(), &names.identity_resources),
            ),
            grants: PersistedGrantStore::new(Collection::<PersistedGrant>::named(
                backend.clone(),
                &names.grants,
            )),
            users: UserStore::new(Collection::<User>::named(backend.clone(), USERS_COLLECTION)),
            roles: RoleStore::new(Collection::<Role>::named(backend, ROLES_COLLECTION)),
        })
    }

    /// The client store.
    #[must_use]
    pub fn clients(&self) -> &ClientStore {
        &self.clients
    }

    /// The resource store.
    #[must_use]
    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    /// The persisted grant store.
    #[must_use]
    pub fn grants(&self) -> &PersistedGrantStore {
        &self.grants
    }

    /// The user store.
    #[must_use]
    pub fn users(&self) -> &UserStore {
        &self.users
    }

    /// The role store.
    #[must_use]
    pub fn roles(&self) -> &RoleStore {
        &self.roles
    }
}
