//! User and role domain types.
//!
//! These records back authentication only; token issuance references users
//! through the grant's subject identifier and is otherwise decoupled.
//! Password hashing and lockout policy are owned by the identity subsystem;
//! this layer stores what that subsystem hands it.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use keystone_store::Document;

/// Normalizes an email or username for indexed lookups.
///
/// Uniqueness is enforced on the normalized form, so `Alice@example.com`
/// and `alice@example.com` collide by construction.
#[must_use]
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

// =============================================================================
// User
// =============================================================================

/// An end-user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier; referenced as the subject of issued grants.
    pub id: Uuid,

    /// Username as entered at registration.
    pub user_name: String,

    /// Uppercase-normalized username, unique across the collection.
    pub normalized_user_name: String,

    /// Email address as entered at registration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Uppercase-normalized email, unique across the collection when
    /// present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_email: Option<String>,

    /// Credential hash produced by the identity subsystem. `None` for
    /// federated accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    /// Consecutive failed sign-in attempts.
    #[serde(default)]
    pub access_failed_count: i32,

    /// Until when the account is locked out, if it is.
    #[serde(default, with = "time::serde::timestamp::option")]
    pub lockout_end: Option<OffsetDateTime>,

    /// Role names assigned to this user.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Document for User {
    const COLLECTION: &'static str = "Users";
}

impl User {
    /// Creates a user with freshly normalized lookup fields.
    #[must_use]
    pub fn new(user_name: impl Into<String>, email: Option<String>) -> Self {
        let user_name = user_name.into();
        Self {
            id: Uuid::new_v4(),
            normalized_user_name: normalize(&user_name),
            user_name,
            normalized_email: email.as_deref().map(normalize),
            email,
            password_hash: None,
            access_failed_count: 0,
            lockout_end: None,
            roles: Vec::new(),
        }
    }

    /// Sets the credential hash.
    #[must_use]
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    /// Returns `true` if the account is locked out at `now`.
    #[must_use]
    pub fn is_locked_out(&self, now: OffsetDateTime) -> bool {
        self.lockout_end.is_some_and(|until| until > now)
    }
}

// =============================================================================
// Role
// =============================================================================

/// A role assignable to users.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Unique identifier.
    pub id: Uuid,

    /// Role name as entered.
    pub name: String,

    /// Uppercase-normalized role name, unique across the collection.
    pub normalized_name: String,
}

impl Document for Role {
    const COLLECTION: &'static str = "Roles";
}

impl Role {
    /// Creates a role with a freshly normalized lookup name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            normalized_name: normalize(&name),
            name,
        }
    }
}
