//! User and role stores.
//!
//! Account storage for the authentication subsystem. Uniqueness of the
//! normalized email, username, and role name is enforced by the backing
//! store's unique indexes, not by a check-then-insert sequence here, so
//! concurrent registrations cannot race past the constraint.

use keystone_store::{Collection, Predicate, StoreError, StoreResult};
use uuid::Uuid;

use crate::types::{Role, User};

// =============================================================================
// User Store
// =============================================================================

/// Storage operations for user accounts.
#[derive(Debug, Clone)]
pub struct UserStore {
    users: Collection<User>,
}

impl UserStore {
    /// Creates a store over the given user collection.
    #[must_use]
    pub fn new(users: Collection<User>) -> Self {
        Self { users }
    }

    /// Finds a user by id.
    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.users
            .single_opt(&Predicate::field("id").eq(id.to_string()))
            .await
    }

    /// Finds a user by normalized email.
    ///
    /// The argument must already be in normalized form (see
    /// [`normalize`](crate::types::normalize)); the lookup is exact-match.
    pub async fn find_by_normalized_email(&self, normalized_email: &str) -> StoreResult<Option<User>> {
        self.users
            .single_opt(&Predicate::field("normalizedEmail").eq(normalized_email))
            .await
    }

    /// Finds a user by normalized username.
    ///
    /// The argument must already be in normalized form; the lookup is
    /// exact-match.
    pub async fn find_by_normalized_user_name(
        &self,
        normalized_user_name: &str,
    ) -> StoreResult<Option<User>> {
        self.users
            .single_opt(&Predicate::field("normalizedUserName").eq(normalized_user_name))
            .await
    }

    /// Creates a new user account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] when the normalized username or
    /// email is already taken - surfaced by the backing unique index, so
    /// the check and the insert cannot be interleaved by a concurrent
    /// registration.
    pub async fn create(&self, user: &User) -> StoreResult<()> {
        if user.normalized_user_name.is_empty() {
            return Err(StoreError::invalid_document(
                "user normalizedUserName must not be empty",
            ));
        }
        self.users.insert(user).await
    }

    /// Replaces an existing account, addressed by its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the account does not exist.
    pub async fn update(&self, user: &User) -> StoreResult<()> {
        let replaced = self
            .users
            .replace(&Predicate::field("id").eq(user.id.to_string()), user)
            .await?;
        if replaced == 0 {
            return Err(StoreError::not_found(self.users.name()));
        }
        Ok(())
    }
}

// =============================================================================
// Role Store
// =============================================================================

/// Storage operations for roles.
#[derive(Debug, Clone)]
pub struct RoleStore {
    roles: Collection<Role>,
}

impl RoleStore {
    /// Creates a store over the given role collection.
    #[must_use]
    pub fn new(roles: Collection<Role>) -> Self {
        Self { roles }
    }

    /// Finds a role by its normalized name (exact match).
    pub async fn find_by_normalized_name(&self, normalized_name: &str) -> StoreResult<Option<Role>> {
        self.roles
            .single_opt(&Predicate::field("normalizedName").eq(normalized_name))
            .await
    }

    /// Creates a new role.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] when the normalized name is
    /// already taken.
    pub async fn create(&self, role: &Role) -> StoreResult<()> {
        if role.normalized_name.is_empty() {
            return Err(StoreError::invalid_document(
                "role normalizedName must not be empty",
            ));
        }
        self.roles.insert(role).await
    }
}
