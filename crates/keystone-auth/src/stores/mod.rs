//! Stores over the document repository.
//!
//! Each store owns the mapping between one entity type and its named
//! collection, and is the sole reader and writer of that collection's
//! uniqueness invariants. The stores themselves are stateless; every
//! operation is a single round trip to the backing store.

pub mod client;
pub mod grant;
pub mod resource;
pub mod user;

pub use client::ClientStore;
pub use grant::PersistedGrantStore;
pub use resource::ResourceStore;
pub use user::{RoleStore, UserStore};
