//! Storage error types for the document store abstraction layer.
//!
//! This module defines all error types that can occur during store operations.

use std::fmt;

/// Errors that can occur during document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document matched a lookup that expected exactly one result.
    #[error("No document matched in '{collection}'")]
    NotFound {
        /// The collection that was queried.
        collection: String,
    },

    /// More than one document matched a predicate the caller assumed unique.
    ///
    /// This is a data-integrity fault, not a lookup miss. It is never
    /// resolved by silently picking one of the matches.
    #[error("Ambiguous result in '{collection}': {matched} documents matched a unique predicate")]
    AmbiguousResult {
        /// The collection that was queried.
        collection: String,
        /// How many documents matched.
        matched: u64,
    },

    /// A unique constraint rejected an insert.
    #[error("Duplicate key in '{collection}': {constraint}")]
    DuplicateKey {
        /// The collection the insert targeted.
        collection: String,
        /// The violated constraint or indexed field.
        constraint: String,
    },

    /// The backing store did not answer within the allowed time.
    ///
    /// Distinct from [`StoreError::NotFound`]: the outcome of the operation
    /// is unknown and the caller may retry.
    #[error("Store operation timed out: {message}")]
    Timeout {
        /// Description of the timed-out operation.
        message: String,
    },

    /// Failed to reach the backing store.
    #[error("Connection failure: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
    },

    /// Document failed domain validation before reaching the backing store.
    #[error("Invalid document: {message}")]
    InvalidDocument {
        /// Description of why the document is invalid.
        message: String,
    },

    /// Document could not be mapped to or from its entity type.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other failure reported by the backing store.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(collection: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
        }
    }

    /// Creates a new `AmbiguousResult` error.
    #[must_use]
    pub fn ambiguous(collection: impl Into<String>, matched: u64) -> Self {
        Self::AmbiguousResult {
            collection: collection.into(),
            matched,
        }
    }

    /// Creates a new `DuplicateKey` error.
    #[must_use]
    pub fn duplicate_key(collection: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::DuplicateKey {
            collection: collection.into(),
            constraint: constraint.into(),
        }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidDocument` error.
    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is an ambiguous result error.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AmbiguousResult { .. })
    }

    /// Returns `true` if this is a duplicate key error.
    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is a connection failure.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::DuplicateKey { .. } => ErrorCategory::Conflict,
            Self::AmbiguousResult { .. } => ErrorCategory::Integrity,
            Self::Timeout { .. } | Self::Connection { .. } => ErrorCategory::Infrastructure,
            Self::InvalidDocument { .. } => ErrorCategory::Validation,
            Self::Serialization(_) | Self::Backend { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of store errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// No matching document. Expected outcome, not logged as an error.
    NotFound,
    /// Unique constraint conflict. Expected under insert races.
    Conflict,
    /// Invariant violation. Must be surfaced, never swallowed.
    Integrity,
    /// Document rejected by domain validation.
    Validation,
    /// Backing store unreachable or slow.
    Infrastructure,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Integrity => write!(f, "integrity"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::not_found("Clients");
        assert_eq!(err.to_string(), "No document matched in 'Clients'");

        let err = StoreError::ambiguous("Clients", 2);
        assert_eq!(
            err.to_string(),
            "Ambiguous result in 'Clients': 2 documents matched a unique predicate"
        );

        let err = StoreError::duplicate_key("PersistedGrants", "key");
        assert_eq!(err.to_string(), "Duplicate key in 'PersistedGrants': key");
    }

    #[test]
    fn test_error_predicates() {
        let err = StoreError::not_found("Clients");
        assert!(err.is_not_found());
        assert!(!err.is_duplicate_key());
        assert!(!err.is_timeout());

        let err = StoreError::timeout("acquire");
        assert!(err.is_timeout());
        assert!(!err.is_not_found());

        let err = StoreError::ambiguous("Users", 3);
        assert!(err.is_ambiguous());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StoreError::not_found("Clients").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StoreError::duplicate_key("Users", "normalizedEmail").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StoreError::ambiguous("Clients", 2).category(),
            ErrorCategory::Integrity
        );
        assert_eq!(
            StoreError::timeout("acquire").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            StoreError::connection("refused").category(),
            ErrorCategory::Infrastructure
        );
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Integrity.to_string(), "integrity");
        assert_eq!(ErrorCategory::Conflict.to_string(), "conflict");
    }
}
