//! # keystone-db-memory
//!
//! In-memory document store backend for Keystone.
//!
//! Implements the `DocumentBackend` contract over a process-local map,
//! for tests and embedded/development scenarios. The observable semantics
//! match the persistent backends: unique-index enforcement is atomic with
//! the insert, and `take_one` is an atomic find-and-remove - both run
//! inside a single write-lock critical section, so a concurrent redeemer
//! of the same document observes either the document or its absence, never
//! an intermediate state.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use keystone_store::{DocumentBackend, Predicate, StoreError};

#[derive(Debug, Default)]
struct CollectionState {
    documents: Vec<Value>,
    unique_fields: Vec<String>,
}

impl CollectionState {
    /// Finds a unique field of `candidate` that collides with a document
    /// already present, skipping documents at the given index (used when
    /// a replace rewrites the matched documents themselves).
    fn unique_collision(&self, candidate: &Value, skip: Option<&[usize]>) -> Option<&str> {
        for field in &self.unique_fields {
            let Some(value) = candidate.get(field) else {
                continue;
            };
            if value.is_null() {
                // Absent and null values never collide, matching the
                // expression-index semantics of the persistent backends.
                continue;
            }
            let collides = self.documents.iter().enumerate().any(|(index, existing)| {
                if skip.is_some_and(|skipped| skipped.contains(&index)) {
                    return false;
                }
                existing.get(field) == Some(value)
            });
            if collides {
                return Some(field);
            }
        }
        None
    }
}

/// In-memory document backend.
///
/// All collections live behind one `RwLock`; reads run concurrently,
/// mutations serialize. Suitable for tests and single-process use, not for
/// durability.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, CollectionState>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map_or(0, |state| state.documents.len())
    }

    /// Returns `true` if `collection` holds no documents.
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn find(&self, collection: &str, predicate: &Predicate) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        let Some(state) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(state
            .documents
            .iter()
            .filter(|doc| predicate.matches(doc))
            .cloned()
            .collect())
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let state = collections.entry(collection.to_string()).or_default();
        if let Some(field) = state.unique_collision(&document, None) {
            return Err(StoreError::duplicate_key(collection, field));
        }
        state.documents.push(document);
        Ok(())
    }

    async fn replace(
        &self,
        collection: &str,
        predicate: &Predicate,
        document: Value,
    ) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(state) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let matched: Vec<usize> = state
            .documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| predicate.matches(doc))
            .map(|(index, _)| index)
            .collect();
        if matched.is_empty() {
            return Ok(0);
        }
        if let Some(field) = state.unique_collision(&document, Some(&matched)) {
            return Err(StoreError::duplicate_key(collection, field));
        }
        for &index in &matched {
            state.documents[index] = document.clone();
        }
        Ok(matched.len() as u64)
    }

    async fn remove(&self, collection: &str, predicate: &Predicate) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(state) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = state.documents.len();
        state.documents.retain(|doc| !predicate.matches(doc));
        Ok((before - state.documents.len()) as u64)
    }

    async fn take_one(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> Result<Option<Value>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(state) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(index) = state.documents.iter().position(|doc| predicate.matches(doc)) else {
            return Ok(None);
        };
        Ok(Some(state.documents.swap_remove(index)))
    }

    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let state = collections.entry(collection.to_string()).or_default();
        if !state.unique_fields.iter().any(|existing| existing == field) {
            state.unique_fields.push(field.to_string());
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn backend_with_unique_key() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.ensure_collection("Grants").await.unwrap();
        backend.ensure_unique_index("Grants", "key").await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_unique_field() {
        let backend = backend_with_unique_key().await;
        backend
            .insert("Grants", json!({"key": "k1"}))
            .await
            .unwrap();
        let err = backend
            .insert("Grants", json!({"key": "k1"}))
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());
        assert_eq!(backend.len("Grants").await, 1);
    }

    #[tokio::test]
    async fn test_null_unique_values_do_not_collide() {
        let backend = MemoryBackend::new();
        backend
            .ensure_unique_index("Users", "normalizedEmail")
            .await
            .unwrap();
        backend
            .insert("Users", json!({"id": "a", "normalizedEmail": null}))
            .await
            .unwrap();
        backend.insert("Users", json!({"id": "b"})).await.unwrap();
        assert_eq!(backend.len("Users").await, 2);
    }

    #[tokio::test]
    async fn test_take_one_removes_exactly_once() {
        let backend = backend_with_unique_key().await;
        backend
            .insert("Grants", json!({"key": "k1", "data": "payload"}))
            .await
            .unwrap();

        let key = Predicate::field("key").eq("k1");
        let first = backend.take_one("Grants", &key).await.unwrap();
        let second = backend.take_one("Grants", &key).await.unwrap();
        assert_eq!(first.unwrap()["data"], "payload");
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_remove_returns_count_and_is_idempotent() {
        let backend = backend_with_unique_key().await;
        backend
            .insert("Grants", json!({"key": "k1", "clientId": "c"}))
            .await
            .unwrap();
        backend
            .insert("Grants", json!({"key": "k2", "clientId": "c"}))
            .await
            .unwrap();

        let by_client = Predicate::field("clientId").eq("c");
        assert_eq!(backend.remove("Grants", &by_client).await.unwrap(), 2);
        assert_eq!(backend.remove("Grants", &by_client).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replace_rewrites_matches_only() {
        let backend = backend_with_unique_key().await;
        backend
            .insert("Grants", json!({"key": "k1", "data": "old"}))
            .await
            .unwrap();
        backend
            .insert("Grants", json!({"key": "k2", "data": "old"}))
            .await
            .unwrap();

        let replaced = backend
            .replace(
                "Grants",
                &Predicate::field("key").eq("k1"),
                json!({"key": "k1", "data": "new"}),
            )
            .await
            .unwrap();
        assert_eq!(replaced, 1);

        let docs = backend
            .find("Grants", &Predicate::field("data").eq("new"))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["key"], "k1");
    }

    #[tokio::test]
    async fn test_replace_respects_unique_index() {
        let backend = backend_with_unique_key().await;
        backend
            .insert("Grants", json!({"key": "k1"}))
            .await
            .unwrap();
        backend
            .insert("Grants", json!({"key": "k2"}))
            .await
            .unwrap();

        let err = backend
            .replace(
                "Grants",
                &Predicate::field("key").eq("k2"),
                json!({"key": "k1"}),
            )
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());
    }

    #[tokio::test]
    async fn test_find_on_missing_collection_is_empty() {
        let backend = MemoryBackend::new();
        let docs = backend.find("Nope", &Predicate::always()).await.unwrap();
        assert!(docs.is_empty());
    }
}
