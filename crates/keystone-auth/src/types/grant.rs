//! Persisted grant domain types.
//!
//! A persisted grant backs an OAuth2/OIDC artifact - authorization code,
//! refresh token, device code, or consent record. Grants are created on
//! issuance, read (or consumed) on redemption, and removed on revocation.
//!
//! # Security Considerations
//!
//! - Grant keys are SHA-256 digests of the opaque token value, never the
//!   value itself.
//! - Expiration is a read-time judgment: a grant past its expiration is
//!   absent to readers even while physically present.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use keystone_store::Document;

// =============================================================================
// Grant Kind
// =============================================================================

/// The protocol artifact a persisted grant backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    /// Single-use authorization code.
    AuthorizationCode,
    /// Long-lived refresh token.
    RefreshToken,
    /// Single-use device code (RFC 8628).
    DeviceCode,
    /// Recorded user consent for a client.
    UserConsent,
}

impl GrantKind {
    /// Returns the stored type discriminator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
            Self::DeviceCode => "device_code",
            Self::UserConsent => "user_consent",
        }
    }

    /// Returns `true` for kinds that are redeemed exactly once.
    #[must_use]
    pub fn is_single_use(&self) -> bool {
        matches!(self, Self::AuthorizationCode | Self::DeviceCode)
    }
}

impl std::fmt::Display for GrantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Persisted Grant
// =============================================================================

/// A persisted OAuth2/OIDC grant record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedGrant {
    /// Unique lookup key, a digest of the opaque token value.
    pub key: String,

    /// What kind of artifact this grant backs.
    #[serde(rename = "type")]
    pub kind: GrantKind,

    /// The client the grant was issued to.
    pub client_id: String,

    /// The subject the grant was issued on behalf of. `None` for
    /// client-credentials flows.
    #[serde(default)]
    pub subject_id: Option<String>,

    /// When the grant was created.
    #[serde(with = "time::serde::timestamp")]
    pub creation_time: OffsetDateTime,

    /// When the grant stops being redeemable.
    #[serde(with = "time::serde::timestamp")]
    pub expiration: OffsetDateTime,

    /// Serialized protocol-specific payload, opaque to the store.
    pub data: String,
}

impl Document for PersistedGrant {
    const COLLECTION: &'static str = "PersistedGrants";
}

impl PersistedGrant {
    /// Validates the grant record.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is empty or the expiration
    /// precedes the creation timestamp.
    pub fn validate(&self) -> Result<(), GrantValidationError> {
        if self.key.is_empty() {
            return Err(GrantValidationError::EmptyKey);
        }
        if self.client_id.is_empty() {
            return Err(GrantValidationError::EmptyClientId);
        }
        if self.expiration < self.creation_time {
            return Err(GrantValidationError::ExpiresBeforeCreation);
        }
        Ok(())
    }

    /// Returns `true` if the grant is no longer redeemable at `now`.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expiration <= now
    }
}

/// Derives a grant key from an opaque token value.
///
/// The key is the lowercase hex SHA-256 digest of the value, so the stored
/// record never contains the redeemable secret itself.
#[must_use]
pub fn grant_key(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Errors from grant record validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrantValidationError {
    /// The lookup key is empty.
    #[error("grant key must not be empty")]
    EmptyKey,

    /// The issuing client is missing.
    #[error("grant client_id must not be empty")]
    EmptyClientId,

    /// Expiration precedes creation.
    #[error("grant expiration must not precede its creation time")]
    ExpiresBeforeCreation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn grant(kind: GrantKind) -> PersistedGrant {
        let now = OffsetDateTime::now_utc();
        PersistedGrant {
            key: grant_key("code-1"),
            kind,
            client_id: "cli1".into(),
            subject_id: Some("alice".into()),
            creation_time: now,
            expiration: now + Duration::seconds(60),
            data: "{}".into(),
        }
    }

    #[test]
    fn test_valid_grant_passes() {
        assert!(grant(GrantKind::AuthorizationCode).validate().is_ok());
    }

    #[test]
    fn test_expiration_before_creation_rejected() {
        let mut g = grant(GrantKind::RefreshToken);
        g.expiration = g.creation_time - Duration::seconds(1);
        assert_eq!(
            g.validate(),
            Err(GrantValidationError::ExpiresBeforeCreation)
        );
    }

    #[test]
    fn test_is_expired_is_a_read_time_judgment() {
        let mut g = grant(GrantKind::DeviceCode);
        let now = OffsetDateTime::now_utc();
        assert!(!g.is_expired(now));
        g.expiration = now - Duration::seconds(1);
        assert!(g.is_expired(now));
        // The boundary instant itself is no longer redeemable
        g.expiration = now;
        assert!(g.is_expired(now));
    }

    #[test]
    fn test_grant_key_is_hex_sha256() {
        let key = grant_key("abc");
        assert_eq!(key.len(), 64);
        assert_eq!(
            key,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(grant_key("abc"), grant_key("abd"));
    }

    #[test]
    fn test_single_use_kinds() {
        assert!(GrantKind::AuthorizationCode.is_single_use());
        assert!(GrantKind::DeviceCode.is_single_use());
        assert!(!GrantKind::RefreshToken.is_single_use());
        assert!(!GrantKind::UserConsent.is_single_use());
    }

    #[test]
    fn test_kind_serializes_as_type_discriminator() {
        let doc = serde_json::to_value(grant(GrantKind::UserConsent)).unwrap();
        assert_eq!(doc["type"], "user_consent");
        assert!(doc["creationTime"].is_i64());
        assert!(doc["expiration"].is_i64());
    }
}
