//! The OAuth1 server-side capability interface.
//!
//! All persistence, replay tracking, and policy live behind this trait; the
//! endpoints only decide *when* to consult or create something, never *how*
//! it is stored.

use super::signature::{HMAC_SHA1, PLAINTEXT, RSA_SHA1};

/// A token key/secret pair issued by an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCredentials {
    /// Opaque token identifier
    pub key: String,
    /// Token secret
    pub secret: String,
}

/// Capability interface the OAuth1 endpoints delegate to.
///
/// Policy getters have conservative defaults; lookup, replay, and
/// persistence methods must be implemented. The dummy credentials keep the
/// signature-verification path constant-time when the real principal is
/// unknown. Implementations should return fixed values that never collide
/// with real ones.
pub trait RequestValidator: Send + Sync {
    /// Reject plain-HTTP requests. Disable only in tests.
    fn enforce_ssl(&self) -> bool {
        true
    }

    /// Signature methods this server accepts
    fn allowed_signature_methods(&self) -> Vec<String> {
        vec![
            HMAC_SHA1.to_string(),
            RSA_SHA1.to_string(),
            PLAINTEXT.to_string(),
        ]
    }

    /// Maximum age, in seconds, of an acceptable `oauth_timestamp`
    fn timestamp_lifetime(&self) -> u64 {
        600
    }

    /// Inclusive (min, max) length bounds for client keys
    fn client_key_bounds(&self) -> (usize, usize) {
        (8, 64)
    }

    /// Whether `client_key` identifies a registered client
    fn validate_client_key(&self, client_key: &str) -> bool;

    /// Shared secret for a client, if it has one
    fn get_client_secret(&self, client_key: &str) -> Option<String>;

    /// PEM public (or private) RSA key registered for a client, RSA-SHA1 only
    fn get_rsa_key(&self, _client_key: &str) -> Option<String> {
        None
    }

    /// Whether `token` is a live request token issued to `client_key`
    fn validate_request_token(&self, client_key: &str, token: &str) -> bool;

    /// Whether `token` is a live access token issued to `client_key`
    fn validate_access_token(&self, client_key: &str, token: &str) -> bool;

    /// Secret of a request token
    fn get_request_token_secret(&self, client_key: &str, token: &str) -> Option<String>;

    /// Secret of an access token
    fn get_access_token_secret(&self, client_key: &str, token: &str) -> Option<String>;

    /// Replay check: false when this (timestamp, nonce) pair has been seen
    /// for the client/token combination
    fn validate_timestamp_and_nonce(
        &self,
        client_key: &str,
        timestamp: u64,
        nonce: &str,
        token: Option<&str>,
    ) -> bool;

    /// Whether `redirect_uri` (`oauth_callback`) is acceptable for the client
    fn validate_redirect_uri(&self, client_key: &str, redirect_uri: &str) -> bool;

    /// Whether the realms requested at the request-token step are within
    /// the client's grant
    fn validate_requested_realms(&self, _client_key: &str, _realms: &[String]) -> bool {
        true
    }

    /// Whether an access token may operate in the given realms
    fn validate_realms(&self, _client_key: &str, _token: &str, _realms: &[String]) -> bool {
        true
    }

    /// Whether `verifier` matches the one issued for `token`
    fn validate_verifier(&self, client_key: &str, token: &str, verifier: &str) -> bool;

    /// Whether a request token exists at all (authorization step, before any
    /// client context is known)
    fn verify_request_token(&self, token: &str) -> bool;

    /// Callback URI recorded when the request token was issued
    fn get_redirect_uri(&self, token: &str) -> Option<String>;

    /// Fixed client key substituted when the real client is unknown.
    ///
    /// Must behave like a real key in every lookup so the verification code
    /// path does not shortcut.
    fn dummy_client(&self) -> String {
        "dummy-client-0000000000".to_string()
    }

    /// Fixed request token substituted when the real token is unknown
    fn dummy_request_token(&self) -> String {
        "dummy-request-token-00".to_string()
    }

    /// Fixed access token substituted when the real token is unknown
    fn dummy_access_token(&self) -> String {
        "dummy-access-token-000".to_string()
    }

    /// Persist a newly issued request token
    fn save_request_token(&self, client_key: &str, token: &TokenCredentials, callback: &str);

    /// Persist a newly issued access token
    fn save_access_token(&self, client_key: &str, token: &TokenCredentials);

    /// Persist the verifier bound to a request token
    fn save_verifier(&self, token: &str, verifier: &str);
}
