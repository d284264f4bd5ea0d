//! The mutable validation context threaded through OAuth2 pipelines.

use serde_json::{Map, Value};

use super::errors::ScopeChanged;

/// Facts established while validating an OAuth2 request.
///
/// Created empty per call and populated in a fixed order; each field is
/// written by exactly one stage:
///
/// - `client_id`, `client_authenticated`: client validation/authentication
///   (validators set `client_id` when they authenticate by credentials);
/// - `redirect_uri`, `response_type`, `state`, `grant_type`: request-shape
///   validation in the grant handler;
/// - `requested_scopes`, `scopes`, `default_scopes_used`: scope resolution;
/// - `user`, `code`, `refresh_token`: validator lookups (`validate_user`,
///   `validate_code`, `validate_refresh_token`); `validate_code` also
///   restores `scopes`, `state`, and `redirect_uri` from the saved code;
/// - `extra_credentials`: validator-supplied claims merged into the token.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    /// Identifier of the requesting client
    pub client_id: Option<String>,
    /// Whether the client proved possession of its credentials
    pub client_authenticated: bool,
    /// Scopes the request asked for, before resolution
    pub requested_scopes: Vec<String>,
    /// Scopes that will be granted
    pub scopes: Vec<String>,
    /// True when the validator's default scopes were substituted
    pub default_scopes_used: bool,
    /// Resource owner reference established by the validator
    pub user: Option<String>,
    /// Opaque client state to echo back
    pub state: Option<String>,
    /// Resolved redirect URI
    pub redirect_uri: Option<String>,
    /// `response_type` of an authorization request
    pub response_type: Option<String>,
    /// `grant_type` of a token request
    pub grant_type: Option<String>,
    /// Authorization code under exchange
    pub code: Option<String>,
    /// Refresh token under exchange
    pub refresh_token: Option<String>,
    /// Extra claims the validator wants merged into the token body
    pub extra_credentials: Option<Map<String, Value>>,
}

impl ValidationContext {
    /// Fresh context for one request
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Space-joined granted scope string, `None` when empty
    #[must_use]
    pub fn scope_string(&self) -> Option<String> {
        if self.scopes.is_empty() {
            None
        } else {
            Some(self.scopes.join(" "))
        }
    }

    /// Whether the granted scopes differ from the requested ones as sets
    #[must_use]
    pub fn scope_changed(&self) -> bool {
        let mut requested = self.requested_scopes.clone();
        let mut granted = self.scopes.clone();
        requested.sort_unstable();
        requested.dedup();
        granted.sort_unstable();
        granted.dedup();
        requested != granted
    }

    /// The [`ScopeChanged`] notification, when granted and requested scopes
    /// differ. `None` means the client got exactly what it asked for.
    #[must_use]
    pub fn scope_change(&self) -> Option<ScopeChanged> {
        if self.scope_changed() {
            Some(ScopeChanged {
                requested: self.requested_scopes.clone(),
                granted: self.scopes.clone(),
            })
        } else {
            None
        }
    }
}

/// Parse a space-delimited scope parameter into tokens
#[must_use]
pub fn parse_scope(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}
