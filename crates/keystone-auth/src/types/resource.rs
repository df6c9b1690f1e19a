//! API and identity resource domain types.
//!
//! Resources describe what a token can be issued for: an API resource
//! exposes a set of scope names, an identity resource is itself a scope
//! carrying user claims. Both are read-mostly and only change through
//! administrative configuration.

use serde::{Deserialize, Serialize};

use keystone_store::Document;

// =============================================================================
// API Resource
// =============================================================================

/// A protected API, addressed by the scopes it exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    /// Unique resource name.
    pub name: String,

    /// Human-readable display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Scope names this API exposes.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// User claims included in tokens issued for this API.
    #[serde(default)]
    pub user_claims: Vec<String>,

    /// Whether this resource can currently be requested.
    pub enabled: bool,
}

impl Document for ApiResource {
    const COLLECTION: &'static str = "ApiResources";
}

impl ApiResource {
    /// Creates an enabled resource exposing the given scopes.
    #[must_use]
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        scopes: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            scopes: scopes.into_iter().map(Into::into).collect(),
            user_claims: Vec::new(),
            enabled: true,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the user claims.
    #[must_use]
    pub fn with_user_claims<S: Into<String>>(
        mut self,
        claims: impl IntoIterator<Item = S>,
    ) -> Self {
        self.user_claims = claims.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` if this API exposes at least one of the given scopes.
    #[must_use]
    pub fn exposes_any(&self, scope_names: &[&str]) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope_names.contains(&scope.as_str()))
    }
}

// =============================================================================
// Identity Resource
// =============================================================================

/// An identity resource: a scope that releases user claims.
///
/// The resource name is the scope name itself (e.g. `openid`, `profile`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResource {
    /// Unique resource name; doubles as the scope name.
    pub name: String,

    /// Human-readable display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// User claims released when this scope is granted.
    #[serde(default)]
    pub user_claims: Vec<String>,

    /// Whether this resource can currently be requested.
    pub enabled: bool,
}

impl Document for IdentityResource {
    const COLLECTION: &'static str = "IdentityResources";
}

impl IdentityResource {
    /// Creates an enabled identity resource releasing the given claims.
    #[must_use]
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        user_claims: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            user_claims: user_claims.into_iter().map(Into::into).collect(),
            enabled: true,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}
