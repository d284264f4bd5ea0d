//! OAuth 1.0a error family.
//!
//! OAuth1 endpoints are direct request/response; there is no redirect
//! channel for errors. Failures serialize as a form-encoded body with a 400
//! (malformed or insecure request) or 401 (authentication failure) status.

use std::borrow::Cow;

use thiserror::Error;

use crate::http::{ResponseParts, encode_form};

/// OAuth 1.0a protocol errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OAuth1Error {
    /// The request is structurally invalid: missing or duplicated
    /// parameters, malformed values, undecodable input
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    /// The signature method is unknown or not allowed by policy
    #[error("invalid_signature_method: {0}")]
    InvalidSignatureMethod(String),

    /// The request arrived over an insecure transport
    #[error("insecure_transport_protocol")]
    InsecureTransport,

    /// Client authentication failed (unknown key or bad signature)
    #[error("invalid_client: {0}")]
    InvalidClient(String),

    /// The supplied request or access token is not valid
    #[error("invalid_token: {0}")]
    InvalidToken(String),

    /// Nonce/timestamp combination was rejected (replay or expiry)
    #[error("invalid_nonce: {0}")]
    InvalidNonce(String),

    /// The verifier does not match the request token
    #[error("invalid_verifier: {0}")]
    InvalidVerifier(String),
}

impl OAuth1Error {
    /// Stable wire code for the form-encoded error body
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidSignatureMethod(_) => "invalid_signature_method",
            Self::InsecureTransport => "insecure_transport_protocol",
            Self::InvalidClient(_) => "invalid_client",
            Self::InvalidToken(_) => "invalid_token",
            Self::InvalidNonce(_) => "invalid_nonce",
            Self::InvalidVerifier(_) => "invalid_verifier",
        }
    }

    /// HTTP status: 400 for malformed/insecure requests, 401 for
    /// authentication failures
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidSignatureMethod(_)
            | Self::InsecureTransport => 400,
            Self::InvalidClient(_)
            | Self::InvalidToken(_)
            | Self::InvalidNonce(_)
            | Self::InvalidVerifier(_) => 401,
        }
    }

    /// Render as a transport-neutral response
    #[must_use]
    pub fn to_response(&self) -> ResponseParts {
        let body = encode_form([(
            Cow::Borrowed("error"),
            Cow::Borrowed(self.code()),
        )]);
        ResponseParts::form(self.status(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_requests_are_400() {
        assert_eq!(OAuth1Error::InvalidRequest("x".into()).status(), 400);
        assert_eq!(OAuth1Error::InsecureTransport.status(), 400);
        assert_eq!(
            OAuth1Error::InvalidSignatureMethod("MD5".into()).status(),
            400
        );
    }

    #[test]
    fn authentication_failures_are_401() {
        assert_eq!(OAuth1Error::InvalidClient("x".into()).status(), 401);
        assert_eq!(OAuth1Error::InvalidToken("x".into()).status(), 401);
        assert_eq!(OAuth1Error::InvalidVerifier("x".into()).status(), 401);
    }

    #[test]
    fn response_body_is_form_encoded() {
        let resp = OAuth1Error::InsecureTransport.to_response();
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body.as_deref(), Some("error=insecure_transport_protocol"));
    }
}
