//! # keystone-store
//!
//! Document store abstraction layer for the Keystone authorization server.
//!
//! This crate defines the contract that all storage backends implement.
//! It does not contain any implementations - those are provided by separate
//! crates.
//!
//! ## Overview
//!
//! The main trait is [`DocumentBackend`], which defines the contract for:
//! - Predicate-based lookup ([`DocumentBackend::find`])
//! - Mutation (insert, replace, remove)
//! - Atomic find-and-remove ([`DocumentBackend::take_one`])
//! - Idempotent collection and unique-index provisioning
//!
//! Typed access is layered on top by [`Collection`], which maps entities to
//! JSON documents and enforces the single-result contract: a lookup that a
//! caller assumes unique fails with [`StoreError::AmbiguousResult`] when the
//! backing data violates the invariant.
//!
//! ## Example
//!
//! ```ignore
//! use keystone_store::{Collection, Predicate};
//!
//! async fn find_client(clients: &Collection<Client>, id: &str) -> Result<Option<Client>, StoreError> {
//!     clients.single_opt(&Predicate::field("clientId").eq(id)).await
//! }
//! ```
//!
//! ## Storage Backends
//!
//! To implement a storage backend, implement the [`DocumentBackend`] trait:
//!
//! ```ignore
//! use async_trait::async_trait;
//! use keystone_store::{DocumentBackend, Predicate, StoreError};
//!
//! struct MyBackend {
//!     // ...
//! }
//!
//! #[async_trait]
//! impl DocumentBackend for MyBackend {
//!     async fn find(&self, collection: &str, predicate: &Predicate) -> Result<Vec<Value>, StoreError> {
//!         // Implementation
//!     }
//!     // ... other methods
//! }
//! ```

mod backend;
mod collection;
mod error;
mod predicate;

pub use backend::{Document, DocumentBackend, DynBackend};
pub use collection::Collection;
pub use error::{ErrorCategory, StoreError};
pub use predicate::{Field, Predicate};

/// Type alias for a store result.
pub type StoreResult<T> = Result<T, StoreError>;
