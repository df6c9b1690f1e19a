//! Domain types stored by the authorization server.

pub mod client;
pub mod grant;
pub mod resource;
pub mod user;

pub use client::{Client, ClientSecret, ClientValidationError, GrantType};
pub use grant::{GrantKind, GrantValidationError, PersistedGrant, grant_key};
pub use resource::{ApiResource, IdentityResource};
pub use user::{Role, User, normalize};
