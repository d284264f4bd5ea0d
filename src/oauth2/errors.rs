//! OAuth 2.0 error taxonomy (RFC 6749 §4.1.2.1, §5.2).
//!
//! The taxonomy splits along one security-critical line: *fatal* errors
//! (anything wrong with the client identity or the redirect URI itself)
//! must never be encoded into a redirect, because the redirect target is
//! exactly what could not be trusted. Everything else is a *normal* error
//! that travels to the client as query/fragment parameters or a JSON body.

use serde_json::json;
use thiserror::Error;

use crate::http::ResponseParts;

/// Error kinds with their stable wire codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // Fatal: must surface to the caller, never redirect.
    /// The supplied redirect URI is malformed or not absolute
    InvalidRedirectUri,
    /// No redirect URI was supplied and the client has no default
    MissingRedirectUri,
    /// The redirect URI does not match any registered for the client
    MismatchingRedirectUri,
    /// No `client_id` in the request
    MissingClientId,
    /// The `client_id` does not identify a known client
    InvalidClientId,

    // Normal: safely encodable toward the client.
    /// Malformed, duplicated, or missing parameters
    InvalidRequest,
    /// The resource owner or server denied the request
    AccessDenied,
    /// The server does not support this response type
    UnsupportedResponseType,
    /// The requested scope is invalid or exceeds the grant
    InvalidScope,
    /// Unexpected server-side failure
    ServerError,
    /// The service is temporarily unable to handle the request
    TemporarilyUnavailable,
    /// Client authentication failed
    InvalidClient,
    /// The grant (code, refresh token, credentials) is invalid or expired
    InvalidGrant,
    /// The client may not use this grant type
    UnauthorizedClient,
    /// The server does not support this grant type
    UnsupportedGrantType,
    /// Revocation was asked to handle an unsupported token type
    UnsupportedTokenType,
}

impl ErrorKind {
    /// Stable wire code.
    ///
    /// Fatal kinds all serialize as `invalid_request`; the finer
    /// distinction exists for the caller, not the wire.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidRedirectUri
            | Self::MissingRedirectUri
            | Self::MismatchingRedirectUri
            | Self::MissingClientId
            | Self::InvalidClientId
            | Self::InvalidRequest => "invalid_request",
            Self::AccessDenied => "access_denied",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::InvalidScope => "invalid_scope",
            Self::ServerError => "server_error",
            Self::TemporarilyUnavailable => "temporarily_unavailable",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::UnsupportedTokenType => "unsupported_token_type",
        }
    }

    /// Whether this error must never be turned into a redirect
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::InvalidRedirectUri
                | Self::MissingRedirectUri
                | Self::MismatchingRedirectUri
                | Self::MissingClientId
                | Self::InvalidClientId
        )
    }

    /// Default HTTP status
    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            Self::AccessDenied
            | Self::InvalidScope
            | Self::InvalidClient
            | Self::InvalidGrant
            | Self::UnauthorizedClient => 401,
            Self::ServerError => 500,
            Self::TemporarilyUnavailable => 503,
            _ => 400,
        }
    }
}

/// An OAuth 2.0 protocol error with its wire payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: {}", self.kind.code(), self.description.as_deref().unwrap_or("-"))]
pub struct OAuth2Error {
    /// What went wrong
    pub kind: ErrorKind,
    /// Optional human-readable detail (`error_description`)
    pub description: Option<String>,
    /// Optional documentation URI (`error_uri`)
    pub uri: Option<String>,
    /// State echoed from the request, when known
    pub state: Option<String>,
}

impl OAuth2Error {
    /// A bare error of the given kind
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            description: None,
            uri: None,
            state: None,
        }
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach the request state for echoing
    #[must_use]
    pub fn with_state(mut self, state: Option<String>) -> Self {
        self.state = state;
        self
    }

    /// Shorthand for `invalid_request` with a description
    #[must_use]
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest).with_description(description)
    }

    /// Shorthand for `invalid_grant` with a description
    #[must_use]
    pub fn invalid_grant(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidGrant).with_description(description)
    }

    /// Shorthand for `invalid_client` with a description
    #[must_use]
    pub fn invalid_client(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidClient).with_description(description)
    }

    /// The error as `(name, value)` pairs for query or fragment encoding
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("error".to_string(), self.kind.code().to_string())];
        if let Some(d) = &self.description {
            pairs.push(("error_description".to_string(), d.clone()));
        }
        if let Some(u) = &self.uri {
            pairs.push(("error_uri".to_string(), u.clone()));
        }
        if let Some(s) = &self.state {
            pairs.push(("state".to_string(), s.clone()));
        }
        pairs
    }

    /// The error as a JSON object string
    #[must_use]
    pub fn json_body(&self) -> String {
        let mut map = serde_json::Map::new();
        map.insert("error".to_string(), json!(self.kind.code()));
        if let Some(d) = &self.description {
            map.insert("error_description".to_string(), json!(d));
        }
        if let Some(u) = &self.uri {
            map.insert("error_uri".to_string(), json!(u));
        }
        if let Some(s) = &self.state {
            map.insert("state".to_string(), json!(s));
        }
        serde_json::Value::Object(map).to_string()
    }

    /// Render as a JSON error response with the kind's default status
    #[must_use]
    pub fn to_json_response(&self) -> ResponseParts {
        ResponseParts::json(self.kind.status(), self.json_body())
    }
}

/// Notification that the granted scope differs from the requested one.
///
/// RFC 6749 §3.3 requires the server to tell the client; whether a client
/// treats the change as fatal is its own decision, so this is a value, not
/// an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeChanged {
    /// Scope the client asked for
    pub requested: Vec<String>,
    /// Scope the server granted
    pub granted: Vec<String>,
}
