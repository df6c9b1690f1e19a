//! Typed collection handles over the document backend.

use std::marker::PhantomData;

use serde_json::Value;
use tracing::error;

use crate::backend::{Document, DynBackend};
use crate::error::StoreError;
use crate::predicate::Predicate;

/// A typed handle to one named collection of a document backend.
///
/// The handle owns the mapping between the entity type `T` and its JSON
/// document form. It is cheap to clone and intended to be resolved once at
/// startup and shared for the lifetime of the process.
pub struct Collection<T> {
    backend: DynBackend,
    name: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            name: self.name.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

impl<T: Document> Collection<T> {
    /// Binds the entity type to its default collection name.
    #[must_use]
    pub fn of(backend: DynBackend) -> Self {
        Self::named(backend, T::COLLECTION)
    }

    /// Binds the entity type to a caller-chosen collection name.
    #[must_use]
    pub fn named(backend: DynBackend, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
            _entity: PhantomData,
        }
    }

    /// The collection name this handle is bound to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the single entity matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when nothing matches and
    /// [`StoreError::AmbiguousResult`] when more than one document matches —
    /// a unique-invariant violation that is logged and surfaced, never
    /// silently resolved by picking a match.
    pub async fn single(&self, predicate: &Predicate) -> Result<T, StoreError> {
        match self.single_opt(predicate).await? {
            Some(entity) => Ok(entity),
            None => Err(StoreError::not_found(&self.name)),
        }
    }

    /// Returns the single entity matching `predicate`, or `None` when
    /// nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AmbiguousResult`] when more than one document
    /// matches.
    pub async fn single_opt(&self, predicate: &Predicate) -> Result<Option<T>, StoreError> {
        let mut matched = self.backend.find(&self.name, predicate).await?;
        match matched.len() {
            0 => Ok(None),
            1 => {
                let entity = serde_json::from_value(matched.remove(0))?;
                Ok(Some(entity))
            }
            n => {
                error!(
                    collection = %self.name,
                    matched = n,
                    "unique predicate matched multiple documents"
                );
                Err(StoreError::ambiguous(&self.name, n as u64))
            }
        }
    }

    /// Returns every entity matching `predicate`.
    pub async fn find(&self, predicate: &Predicate) -> Result<Vec<T>, StoreError> {
        let documents = self.backend.find(&self.name, predicate).await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    /// Inserts an entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if a unique index rejects it.
    pub async fn insert(&self, entity: &T) -> Result<(), StoreError> {
        let document = serde_json::to_value(entity)?;
        self.backend.insert(&self.name, document).await
    }

    /// Replaces every document matching `predicate` with `entity`.
    ///
    /// Returns the number of documents replaced.
    pub async fn replace(&self, predicate: &Predicate, entity: &T) -> Result<u64, StoreError> {
        let document = serde_json::to_value(entity)?;
        self.backend.replace(&self.name, predicate, document).await
    }

    /// Removes every document matching `predicate`.
    ///
    /// Returns the number of documents removed. Removing nothing is not an
    /// error.
    pub async fn remove(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        self.backend.remove(&self.name, predicate).await
    }

    /// Atomically removes and returns one entity matching `predicate`.
    ///
    /// Exactly one of any number of concurrent callers for the same
    /// document observes `Some`.
    pub async fn take_one(&self, predicate: &Predicate) -> Result<Option<T>, StoreError> {
        let taken = self.backend.take_one(&self.name, predicate).await?;
        match taken {
            Some(document) => Ok(Some(serde_json::from_value(document)?)),
            None => Ok(None),
        }
    }

    /// Raw document lookup, bypassing entity deserialization.
    ///
    /// Useful for administrative tooling that inspects collections without
    /// the entity type.
    pub async fn find_raw(&self, predicate: &Predicate) -> Result<Vec<Value>, StoreError> {
        self.backend.find(&self.name, predicate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Arc;

    use crate::backend::DocumentBackend;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Widget {
        name: String,
    }

    impl Document for Widget {
        const COLLECTION: &'static str = "Widgets";
    }

    /// Backend stub returning a fixed document set for every query.
    struct FixedBackend {
        documents: Vec<Value>,
    }

    #[async_trait]
    impl DocumentBackend for FixedBackend {
        async fn find(&self, _: &str, predicate: &Predicate) -> Result<Vec<Value>, StoreError> {
            Ok(self
                .documents
                .iter()
                .filter(|doc| predicate.matches(doc))
                .cloned()
                .collect())
        }

        async fn insert(&self, _: &str, _: Value) -> Result<(), StoreError> {
            Ok(())
        }

        async fn replace(&self, _: &str, _: &Predicate, _: Value) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn remove(&self, _: &str, _: &Predicate) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn take_one(&self, _: &str, _: &Predicate) -> Result<Option<Value>, StoreError> {
            Ok(None)
        }

        async fn ensure_collection(&self, _: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn ensure_unique_index(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "fixed"
        }
    }

    fn collection(documents: Vec<Value>) -> Collection<Widget> {
        Collection::of(Arc::new(FixedBackend { documents }))
    }

    #[tokio::test]
    async fn test_single_zero_matches_is_not_found() {
        let widgets = collection(vec![]);
        let err = widgets
            .single(&Predicate::field("name").eq("a"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let none = widgets
            .single_opt(&Predicate::field("name").eq("a"))
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_single_one_match_deserializes() {
        let widgets = collection(vec![json!({"name": "a"})]);
        let widget = widgets
            .single(&Predicate::field("name").eq("a"))
            .await
            .unwrap();
        assert_eq!(widget.name, "a");
    }

    #[tokio::test]
    async fn test_single_multiple_matches_is_ambiguous() {
        let widgets = collection(vec![json!({"name": "a"}), json!({"name": "a"})]);
        let err = widgets
            .single(&Predicate::field("name").eq("a"))
            .await
            .unwrap_err();
        assert!(err.is_ambiguous());

        // single_opt surfaces the same integrity fault instead of None
        let err = widgets
            .single_opt(&Predicate::field("name").eq("a"))
            .await
            .unwrap_err();
        assert!(err.is_ambiguous());
    }

    #[tokio::test]
    async fn test_find_maps_all_documents() {
        let widgets = collection(vec![json!({"name": "a"}), json!({"name": "b"})]);
        let all = widgets.find(&Predicate::always()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_named_overrides_default_collection() {
        let widgets: Collection<Widget> =
            Collection::named(Arc::new(FixedBackend { documents: vec![] }), "Gadgets");
        assert_eq!(widgets.name(), "Gadgets");
        assert_eq!(collection(vec![]).name(), "Widgets");
    }
}
