//! The document backend contract that all storage backends implement.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;
use crate::predicate::Predicate;

/// An entity that can be stored as a JSON document in a named collection.
///
/// The associated collection name is a default; callers may bind the entity
/// to a differently named collection when constructing a
/// [`Collection`](crate::Collection) handle.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Default collection name for this entity type.
    const COLLECTION: &'static str;
}

/// The contract every document store backend must implement.
///
/// The trait is object-safe: entities cross it as raw JSON documents, and
/// queries cross it as [`Predicate`] values, so the contract stays
/// storage-agnostic and swappable. Typed access is layered on top by
/// [`Collection`](crate::Collection).
///
/// Implementations must be thread-safe (`Send + Sync`); handles are created
/// once at startup and shared read-only for the lifetime of the process.
///
/// # Atomicity requirements
///
/// Two operations carry hard atomicity contracts that implementations must
/// provide via the backing store itself, never via a check-then-act sequence
/// in process:
///
/// - [`insert`](DocumentBackend::insert) must rely on a backing unique index
///   to reject duplicates, closing the race between existence check and
///   insert.
/// - [`take_one`](DocumentBackend::take_one) must remove and return a
///   matching document in a single atomic step: of any number of concurrent
///   callers for the same document, exactly one observes it.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Returns all documents in `collection` matching `predicate`.
    ///
    /// No ordering is guaranteed.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure failures, never for an
    /// empty result.
    async fn find(&self, collection: &str, predicate: &Predicate) -> Result<Vec<Value>, StoreError>;

    /// Inserts a document into `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if a unique index rejects the
    /// document.
    async fn insert(&self, collection: &str, document: Value) -> Result<(), StoreError>;

    /// Replaces every document matching `predicate` with `document`.
    ///
    /// Returns the number of documents replaced.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if the replacement violates a
    /// unique index.
    async fn replace(
        &self,
        collection: &str,
        predicate: &Predicate,
        document: Value,
    ) -> Result<u64, StoreError>;

    /// Removes every document matching `predicate` in one atomic statement.
    ///
    /// Returns the number of documents removed; removing zero documents is
    /// not an error.
    async fn remove(&self, collection: &str, predicate: &Predicate) -> Result<u64, StoreError>;

    /// Atomically removes and returns one document matching `predicate`.
    ///
    /// Returns `None` when nothing matches. Under concurrent calls for the
    /// same document, exactly one caller receives `Some`.
    async fn take_one(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> Result<Option<Value>, StoreError>;

    /// Ensures `collection` exists. Idempotent; safe to run on every startup.
    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError>;

    /// Ensures a unique index on `field` of `collection`.
    ///
    /// Idempotent; safe to run on every startup. The index must be enforced
    /// by the backing store, not emulated by the caller.
    async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// Type alias for a shared backend trait object.
pub type DynBackend = std::sync::Arc<dyn DocumentBackend>;
