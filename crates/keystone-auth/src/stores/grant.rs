//! Persisted grant store.
//!
//! The lifecycle store for authorization codes, refresh tokens, device
//! codes, and consent records.
//!
//! # Security Considerations
//!
//! - Redemption of a single-use grant goes through [`PersistedGrantStore::consume`],
//!   which removes and returns the record in one atomic backend step: of
//!   two concurrent redeemers, exactly one sees the payload.
//! - A grant past its expiration is absent to every reader, whether or not
//!   the background reaper has purged it yet.
//! - Unknown, expired, and already-consumed keys are indistinguishable to
//!   callers - all collapse to an absent result.

use time::OffsetDateTime;
use tracing::debug;

use keystone_store::{Collection, Predicate, StoreError, StoreResult};

use crate::types::{GrantKind, PersistedGrant};

/// Storage operations for persisted grants.
#[derive(Debug, Clone)]
pub struct PersistedGrantStore {
    grants: Collection<PersistedGrant>,
}

impl PersistedGrantStore {
    /// Creates a store over the given grant collection.
    #[must_use]
    pub fn new(grants: Collection<PersistedGrant>) -> Self {
        Self { grants }
    }

    fn key_predicate(key: &str) -> Predicate {
        Predicate::field("key").eq(key)
    }

    /// Persists a new grant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDocument`] if the record fails
    /// validation and [`StoreError::DuplicateKey`] if the key already
    /// exists. Keys carry enough entropy that a collision signals an attack
    /// or a bug, not legitimate reuse.
    pub async fn create(&self, grant: &PersistedGrant) -> StoreResult<()> {
        grant
            .validate()
            .map_err(|err| StoreError::invalid_document(err.to_string()))?;
        self.grants.insert(grant).await?;
        debug!(
            kind = %grant.kind,
            client_id = %grant.client_id,
            "grant persisted"
        );
        Ok(())
    }

    /// Finds a grant by its exact key.
    ///
    /// Returns `None` for unknown keys and for grants that are logically
    /// expired, even when the expired record is still physically present.
    pub async fn get_by_key(&self, key: &str) -> StoreResult<Option<PersistedGrant>> {
        let found = self.grants.single_opt(&Self::key_predicate(key)).await?;
        Ok(found.filter(|grant| !grant.is_expired(OffsetDateTime::now_utc())))
    }

    /// Redeems a single-use grant: atomically removes and returns it.
    ///
    /// Of any number of concurrent redeemers for the same key, exactly one
    /// observes the payload; the rest observe `None`. An expired record hit
    /// by the take is discarded and reported as `None`, indistinguishable
    /// from an unknown key.
    pub async fn consume(&self, key: &str) -> StoreResult<Option<PersistedGrant>> {
        let taken = self.grants.take_one(&Self::key_predicate(key)).await?;
        match taken {
            Some(grant) if grant.is_expired(OffsetDateTime::now_utc()) => {
                debug!(kind = %grant.kind, "expired grant discarded on redemption");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Removes a grant by key. Idempotent; removing an absent key is not an
    /// error, and once removed a key is never retrievable again.
    pub async fn remove_by_key(&self, key: &str) -> StoreResult<()> {
        self.grants.remove(&Self::key_predicate(key)).await?;
        Ok(())
    }

    /// Bulk revoke: removes every grant for a subject+client pair, narrowed
    /// to one kind when given.
    ///
    /// The removal is a single backend statement for the matched scope, so
    /// no partially revoked state is ever observable. Returns the number of
    /// grants removed.
    pub async fn remove_all(
        &self,
        subject_id: &str,
        client_id: &str,
        kind: Option<GrantKind>,
    ) -> StoreResult<u64> {
        let mut predicate = Predicate::field("subjectId")
            .eq(subject_id)
            .and(Predicate::field("clientId").eq(client_id));
        if let Some(kind) = kind {
            predicate = predicate.and(Predicate::field("type").eq(kind.as_str()));
        }
        let removed = self.grants.remove(&predicate).await?;
        debug!(subject_id, client_id, removed, "grants revoked");
        Ok(removed)
    }

    /// Purges grants whose expiration is in the past.
    ///
    /// Readers already treat expired grants as absent; this only reclaims
    /// storage. Returns the number of grants purged.
    pub async fn remove_expired(&self) -> StoreResult<u64> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.grants
            .remove(&Predicate::field("expiration").lt(now))
            .await
    }
}
