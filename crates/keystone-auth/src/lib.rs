//! # keystone-auth
//!
//! Entity types and stores for the Keystone authorization server.
//!
//! This crate is the persistence and lookup layer an OAuth2/OIDC
//! authorization server resolves registered clients, protected resources,
//! and issued grants against. Every token issuance and validation depends
//! on the exact-match lookups, uniqueness guarantees, and expiration
//! handling implemented here.
//!
//! ## Overview
//!
//! Each store owns one entity type and its named collection, and delegates
//! all storage access to the document repository contract from
//! `keystone-store`. The stores are stateless: all mutable state lives in
//! the backing document store, every operation is a single round trip, and
//! no lookup is cached - staleness on the security-critical path is not
//! acceptable.
//!
//! ## Modules
//!
//! - [`types`] - Client, resource, grant, user, and role entity types
//! - [`stores`] - The client, resource, grant, user, and role stores
//! - [`registry`] - Startup wiring: collection names, index provisioning
//! - [`reaper`] - Background purge of expired grants
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use keystone_auth::{AuthStores, CollectionNames};
//!
//! let backend = Arc::new(some_document_backend);
//! let stores = AuthStores::initialize(backend, CollectionNames::default()).await?;
//!
//! if let Some(client) = stores.clients().find_by_client_id("my-app").await? {
//!     println!("{}", client.client_name);
//! }
//! ```

pub mod reaper;
pub mod registry;
pub mod stores;
pub mod types;

pub use reaper::spawn_grant_reaper;
pub use registry::{AuthStores, CollectionNames, ROLES_COLLECTION, USERS_COLLECTION};
pub use stores::{ClientStore, PersistedGrantStore, ResourceStore, RoleStore, UserStore};
pub use types::{
    ApiResource, Client, ClientSecret, ClientValidationError, GrantKind, GrantType,
    GrantValidationError, IdentityResource, PersistedGrant, Role, User, grant_key, normalize,
};
