//! The OAuth2 server-side capability interface.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::http::Request;

use super::context::ValidationContext;

/// An authorization code artifact handed to the validator for persistence.
///
/// The validator must record the binding to client, redirect URI, scopes,
/// and state so `validate_code` can restore them at exchange time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    /// The opaque code value
    pub code: String,
    /// Redirect URI the code was issued against
    pub redirect_uri: Option<String>,
    /// Scopes granted to the code
    pub scopes: Vec<String>,
    /// Client state at issuance
    pub state: Option<String>,
}

/// A created token body as a JSON object (access token, type, expiry,
/// optional refresh token, scope, state, and validator extras)
pub type TokenPayload = Map<String, Value>;

/// Capability interface the OAuth2 grant handlers and endpoints delegate to.
///
/// Everything that touches storage, client registries, or user databases
/// goes through here. Policy getters carry defaults; persistence and
/// authentication lookups must be implemented. Optional capabilities that
/// only some deployments need default to
/// [`Error::CapabilityNotImplemented`], which keeps a configuration bug
/// distinguishable from a protocol error.
#[allow(unused_variables)]
pub trait RequestValidator: Send + Sync {
    /// Whether the service is accepting requests at all.
    ///
    /// Checked by the endpoint guard before any grant logic runs.
    fn is_available(&self) -> bool {
        true
    }

    /// Whether this request must carry full client credentials.
    ///
    /// Public clients (no secret) return false and are identified through
    /// [`Self::authenticate_client_id`] instead.
    fn client_authentication_required(&self, request: &Request) -> bool {
        true
    }

    /// Whether a new refresh token replaces the old one on refresh
    fn rotate_refresh_token(&self, request: &Request) -> bool {
        true
    }

    /// Access token lifetime in seconds
    fn token_expires_in(&self) -> u64 {
        3600
    }

    /// Token type hints the revocation endpoint accepts
    fn get_revocable_token_types(&self) -> Vec<String> {
        vec!["access_token".to_string(), "refresh_token".to_string()]
    }

    /// Authenticate a confidential client from the request credentials.
    ///
    /// On success the implementation must set `ctx.client_id`.
    fn authenticate_client(&self, request: &Request, ctx: &mut ValidationContext) -> bool;

    /// Establish the identity of a public (non-authenticating) client
    fn authenticate_client_id(&self, client_id: &str, request: &Request) -> bool;

    /// Whether `client_id` identifies a known client (no authentication)
    fn validate_client_id(&self, client_id: &str, request: &Request) -> bool;

    /// Whether the exact `redirect_uri` is registered for the client
    fn validate_redirect_uri(&self, client_id: &str, redirect_uri: &str) -> bool;

    /// The client's registered default redirect URI, if it has exactly one
    fn get_default_redirect_uri(&self, client_id: &str) -> Option<String>;

    /// Whether `redirect_uri` matches the one used when `code` was issued
    fn confirm_redirect_uri(
        &self,
        client_id: &str,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> bool;

    /// Whether the requested scopes are permitted for this client
    fn validate_scopes(&self, client_id: &str, scopes: &[String], request: &Request) -> bool;

    /// Scopes substituted when a request names none
    fn get_default_scopes(&self, client_id: &str) -> Vec<String>;

    /// Whether the client may use this response type
    fn validate_response_type(&self, client_id: &str, response_type: &str) -> bool;

    /// Whether the client may use this grant type
    fn validate_grant_type(&self, client_id: &str, grant_type: &str) -> bool;

    /// Persist a freshly issued authorization code
    fn save_authorization_code(&self, client_id: &str, code: &AuthorizationCode, request: &Request);

    /// Whether `code` is live and was issued to `client_id`.
    ///
    /// On success the implementation must restore the code's bindings into
    /// `ctx`: `scopes`, `state`, `redirect_uri`, and `user`.
    fn validate_code(&self, client_id: &str, code: &str, ctx: &mut ValidationContext) -> bool;

    /// Burn a code after use; a second exchange must then fail
    fn invalidate_authorization_code(&self, client_id: &str, code: &str);

    /// Persist a created token before it is handed out
    fn save_bearer_token(&self, token: &TokenPayload, ctx: &ValidationContext);

    /// Whether the bearer token grants the required scopes.
    ///
    /// Implementations populate `ctx` (client, user, scopes) on success.
    fn validate_bearer_token(
        &self,
        token: &str,
        required_scopes: &[String],
        ctx: &mut ValidationContext,
    ) -> bool;

    /// Whether the refresh token is live and belongs to the client in `ctx`
    fn validate_refresh_token(&self, refresh_token: &str, ctx: &mut ValidationContext) -> bool;

    /// The scopes originally granted alongside this refresh token
    fn get_original_scopes(&self, refresh_token: &str) -> Vec<String>;

    /// Escape hatch: allow a refresh-scope request outside the original
    /// scope. Default: no exception.
    fn is_within_original_scope(&self, requested: &[String], refresh_token: &str) -> bool {
        false
    }

    /// Authenticate a resource owner (password grant only).
    ///
    /// On success the implementation must set `ctx.user`.
    fn validate_user(
        &self,
        username: &str,
        password: &str,
        ctx: &mut ValidationContext,
    ) -> Result<bool> {
        Err(Error::CapabilityNotImplemented("validate_user"))
    }

    /// Revoke a token. Unknown tokens are not an error, as revocation is
    /// idempotent by specification.
    fn revoke_token(&self, token: &str, token_type_hint: Option<&str>) -> Result<()> {
        Err(Error::CapabilityNotImplemented("revoke_token"))
    }

    /// Extra claims to merge into a token body
    fn get_extra_token_credentials(&self, ctx: &ValidationContext) -> Option<Map<String, Value>> {
        None
    }
}
