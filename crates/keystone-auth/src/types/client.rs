//! OAuth 2.0 Client domain types.
//!
//! This module defines the `Client` struct and related types for OAuth 2.0
//! client registrations. A client document is immutable at request time and
//! is only mutated through administrative registration.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use keystone_store::Document;

// =============================================================================
// Grant Type
// =============================================================================

/// OAuth 2.0 grant types.
///
/// Defines the authorization flows a client is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization Code flow.
    AuthorizationCode,
    /// Client Credentials flow (confidential clients only).
    ClientCredentials,
    /// Refresh Token flow.
    RefreshToken,
    /// Device Authorization flow (RFC 8628).
    DeviceCode,
}

impl GrantType {
    /// Returns the OAuth 2.0 grant_type parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
            Self::DeviceCode => "urn:ietf:params:oauth:grant-type:device_code",
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Client Secret
// =============================================================================

/// A hashed client secret with an optional expiration.
///
/// Only the hash is ever stored; the plaintext secret exists solely at
/// registration time and inside the credential check of the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSecret {
    /// Hash of the secret value.
    pub hash: String,

    /// When this secret stops being accepted. `None` means it does not
    /// expire.
    #[serde(default, with = "time::serde::timestamp::option")]
    pub expiration: Option<OffsetDateTime>,
}

impl ClientSecret {
    /// Creates a non-expiring secret from a precomputed hash.
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            expiration: None,
        }
    }

    /// Sets the expiration timestamp.
    #[must_use]
    pub fn with_expiration(mut self, expiration: OffsetDateTime) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Returns `true` if the secret is no longer accepted at `now`.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expiration.is_some_and(|expiration| expiration <= now)
    }
}

// =============================================================================
// Client
// =============================================================================

/// OAuth 2.0 Client resource.
///
/// Represents an OAuth client registration with credentials and
/// configuration. Created at registration, read on every authorization and
/// token request, deleted on de-registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique client identifier used in OAuth flows.
    pub client_id: String,

    /// Human-readable display name.
    pub client_name: String,

    /// Hashed secrets accepted for this client.
    #[serde(default)]
    pub client_secrets: Vec<ClientSecret>,

    /// OAuth 2.0 grant types this client is allowed to use.
    pub grant_types: Vec<GrantType>,

    /// OAuth scopes this client is allowed to request.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Allowed redirect URIs for authorization code flow, in registration
    /// order.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Whether the consent screen is shown for this client.
    pub require_consent: bool,

    /// Whether this client may request refresh tokens.
    pub allow_offline_access: bool,

    /// Whether this client is currently active and can be used.
    pub enabled: bool,
}

impl Document for Client {
    const COLLECTION: &'static str = "Clients";
}

impl Client {
    /// Validates the client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client configuration is invalid.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.client_id.is_empty() {
            return Err(ClientValidationError::EmptyClientId);
        }

        if self.client_name.is_empty() {
            return Err(ClientValidationError::EmptyName);
        }

        if self.grant_types.is_empty() {
            return Err(ClientValidationError::NoGrantTypes);
        }

        // Authorization code flow requires redirect URIs
        if self.grant_types.contains(&GrantType::AuthorizationCode) && self.redirect_uris.is_empty()
        {
            return Err(ClientValidationError::NoRedirectUris);
        }

        for uri in &self.redirect_uris {
            if url::Url::parse(uri).is_err() {
                return Err(ClientValidationError::InvalidRedirectUri { uri: uri.clone() });
            }
        }

        Ok(())
    }

    /// Checks if the given grant type is allowed for this client.
    #[must_use]
    pub fn is_grant_type_allowed(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains(&grant_type)
    }

    /// Checks if the given redirect URI is registered for this client.
    ///
    /// The comparison is exact; callers must not normalize or
    /// substring-match redirect targets.
    #[must_use]
    pub fn is_redirect_uri_allowed(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|allowed| allowed == uri)
    }

    /// Checks if the given scope is allowed for this client.
    #[must_use]
    pub fn is_scope_allowed(&self, scope: &str) -> bool {
        self.scopes.iter().any(|allowed| allowed == scope)
    }

    /// Returns the secrets still accepted at `now`.
    #[must_use]
    pub fn active_secrets(&self, now: OffsetDateTime) -> Vec<&ClientSecret> {
        self.client_secrets
            .iter()
            .filter(|secret| !secret.is_expired(now))
            .collect()
    }
}

/// Errors from client configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientValidationError {
    /// client_id is empty.
    #[error("client_id must not be empty")]
    EmptyClientId,

    /// Display name is empty.
    #[error("client name must not be empty")]
    EmptyName,

    /// No grant types configured.
    #[error("client must allow at least one grant type")]
    NoGrantTypes,

    /// Authorization code flow without redirect URIs.
    #[error("authorization_code clients must register at least one redirect URI")]
    NoRedirectUris,

    /// A redirect URI is not an absolute URL.
    #[error("invalid redirect URI: {uri}")]
    InvalidRedirectUri {
        /// The rejected URI.
        uri: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn valid_client() -> Client {
        Client {
            client_id: "cli1".into(),
            client_name: "Test Client".into(),
            client_secrets: vec![ClientSecret::new("hash")],
            grant_types: vec![GrantType::AuthorizationCode, GrantType::RefreshToken],
            scopes: vec!["openid".into(), "api1.read".into()],
            redirect_uris: vec!["https://app/cb".into()],
            require_consent: false,
            allow_offline_access: true,
            enabled: true,
        }
    }

    #[test]
    fn test_valid_client_passes() {
        assert!(valid_client().validate().is_ok());
    }

    #[test]
    fn test_empty_client_id_rejected() {
        let mut client = valid_client();
        client.client_id.clear();
        assert_eq!(
            client.validate(),
            Err(ClientValidationError::EmptyClientId)
        );
    }

    #[test]
    fn test_authorization_code_requires_redirect_uri() {
        let mut client = valid_client();
        client.redirect_uris.clear();
        assert_eq!(
            client.validate(),
            Err(ClientValidationError::NoRedirectUris)
        );
    }

    #[test]
    fn test_relative_redirect_uri_rejected() {
        let mut client = valid_client();
        client.redirect_uris = vec!["/cb".into()];
        assert!(matches!(
            client.validate(),
            Err(ClientValidationError::InvalidRedirectUri { .. })
        ));
    }

    #[test]
    fn test_grant_type_and_redirect_checks_are_exact() {
        let client = valid_client();
        assert!(client.is_grant_type_allowed(GrantType::AuthorizationCode));
        assert!(!client.is_grant_type_allowed(GrantType::ClientCredentials));
        assert!(client.is_redirect_uri_allowed("https://app/cb"));
        assert!(!client.is_redirect_uri_allowed("https://app/cb/other"));
        assert!(!client.is_redirect_uri_allowed("https://APP/cb"));
    }

    #[test]
    fn test_secret_expiration() {
        let now = OffsetDateTime::now_utc();
        let fresh = ClientSecret::new("a");
        let stale = ClientSecret::new("b").with_expiration(now - Duration::seconds(1));
        assert!(!fresh.is_expired(now));
        assert!(stale.is_expired(now));

        let mut client = valid_client();
        client.client_secrets = vec![fresh.clone(), stale];
        let active = client.active_secrets(now);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].hash, "a");
    }

    #[test]
    fn test_grant_type_wire_values() {
        assert_eq!(GrantType::AuthorizationCode.as_str(), "authorization_code");
        assert_eq!(
            serde_json::to_value(GrantType::DeviceCode).unwrap(),
            serde_json::json!("device_code")
        );
    }
}
