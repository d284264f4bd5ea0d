//! Client-side request signing (RFC 5849 §3.1).

use std::borrow::Cow;

use tracing::debug;

use crate::generate::{random_nonce, unix_timestamp};
use crate::http::{Body, Request, encode_form};

use super::base_string::{normalize_base_string_uri, signature_base_string};
use super::errors::OAuth1Error;
use super::parameters::{collect_parameters, format_authorization_header, normalize_parameters};
use super::signature::{
    HMAC_SHA1, SignatureMethodRegistry, SigningCredentials,
};

/// Where the signed `oauth_*` parameters are placed on the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignaturePlacement {
    /// `Authorization: OAuth …` header (the default)
    #[default]
    AuthHeader,
    /// Appended to the URI query string
    Query,
    /// Appended to the form-encoded body
    Body,
}

/// An OAuth 1.0a signing client.
///
/// Holds the client credentials and signing policy; [`Client::sign`] takes a
/// request and returns a signed copy. Timestamp and nonce are generated per
/// call unless pinned, which tests use for deterministic output.
#[derive(Debug, Clone)]
pub struct Client {
    /// Client (consumer) key
    pub client_key: String,
    /// Client (consumer) secret
    pub client_secret: Option<String>,
    /// Resource owner (token) key
    pub resource_owner_key: Option<String>,
    /// Resource owner (token) secret
    pub resource_owner_secret: Option<String>,
    /// Signature method wire token, `HMAC-SHA1` by default
    pub signature_method: String,
    /// Parameter placement policy
    pub placement: SignaturePlacement,
    /// Realm emitted in the Authorization header, never signed
    pub realm: Option<String>,
    /// `oauth_callback` for the request-token leg
    pub callback_uri: Option<String>,
    /// `oauth_verifier` for the access-token leg
    pub verifier: Option<String>,
    /// PEM RSA private key, RSA-SHA1 only
    pub rsa_key: Option<String>,
    /// Pinned timestamp (testing)
    pub forced_timestamp: Option<u64>,
    /// Pinned nonce (testing)
    pub forced_nonce: Option<String>,
    registry: SignatureMethodRegistry,
}

impl Client {
    /// Create a client signing with HMAC-SHA1 and header placement
    #[must_use]
    pub fn new(client_key: impl Into<String>) -> Self {
        Self {
            client_key: client_key.into(),
            client_secret: None,
            resource_owner_key: None,
            resource_owner_secret: None,
            signature_method: HMAC_SHA1.to_string(),
            placement: SignaturePlacement::AuthHeader,
            realm: None,
            callback_uri: None,
            verifier: None,
            rsa_key: None,
            forced_timestamp: None,
            forced_nonce: None,
            registry: SignatureMethodRegistry::standard(),
        }
    }

    /// Set the client secret
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Set resource owner token and secret
    #[must_use]
    pub fn with_resource_owner(
        mut self,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.resource_owner_key = Some(key.into());
        self.resource_owner_secret = Some(secret.into());
        self
    }

    /// Set the signature method wire token
    #[must_use]
    pub fn with_signature_method(mut self, method: impl Into<String>) -> Self {
        self.signature_method = method.into();
        self
    }

    /// Set the parameter placement policy
    #[must_use]
    pub fn with_placement(mut self, placement: SignaturePlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Set the Authorization header realm
    #[must_use]
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    /// Set `oauth_callback`
    #[must_use]
    pub fn with_callback(mut self, uri: impl Into<String>) -> Self {
        self.callback_uri = Some(uri.into());
        self
    }

    /// Set `oauth_verifier`
    #[must_use]
    pub fn with_verifier(mut self, verifier: impl Into<String>) -> Self {
        self.verifier = Some(verifier.into());
        self
    }

    /// Set the PEM RSA private key for RSA-SHA1
    #[must_use]
    pub fn with_rsa_key(mut self, pem: impl Into<String>) -> Self {
        self.rsa_key = Some(pem.into());
        self
    }

    /// Pin timestamp and nonce for deterministic signing
    #[must_use]
    pub fn with_fixed_timestamp_nonce(
        mut self,
        timestamp: u64,
        nonce: impl Into<String>,
    ) -> Self {
        self.forced_timestamp = Some(timestamp);
        self.forced_nonce = Some(nonce.into());
        self
    }

    /// Replace the signature method registry (custom methods)
    #[must_use]
    pub fn with_registry(mut self, registry: SignatureMethodRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The `oauth_*` protocol parameters for one signing pass, signature
    /// excluded
    fn oauth_params(&self) -> Vec<(String, String)> {
        let timestamp = self.forced_timestamp.unwrap_or_else(unix_timestamp);
        let nonce = self
            .forced_nonce
            .clone()
            .unwrap_or_else(random_nonce);

        let mut params = vec![
            ("oauth_nonce".to_string(), nonce),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), "1.0".to_string()),
            (
                "oauth_signature_method".to_string(),
                self.signature_method.clone(),
            ),
            ("oauth_consumer_key".to_string(), self.client_key.clone()),
        ];
        if let Some(token) = &self.resource_owner_key {
            params.push(("oauth_token".to_string(), token.clone()));
        }
        if let Some(callback) = &self.callback_uri {
            params.push(("oauth_callback".to_string(), callback.clone()));
        }
        if let Some(verifier) = &self.verifier {
            params.push(("oauth_verifier".to_string(), verifier.clone()));
        }
        params
    }

    /// Sign a request, returning a copy with the `oauth_*` parameters placed
    /// per policy.
    ///
    /// GET/HEAD requests with a body are rejected, since OAuth1 forbids signing a
    /// body on bodiless verbs. A raw (non-form) body is never included in
    /// the signature base.
    pub fn sign(&self, request: &Request) -> Result<Request, OAuth1Error> {
        let method_upper = request.method.to_uppercase();
        if matches!(method_upper.as_str(), "GET" | "HEAD") && !request.body.is_empty() {
            return Err(OAuth1Error::InvalidRequest(format!(
                "refusing to sign a body on a {method_upper} request"
            )));
        }
        if matches!(request.body, Body::Form(_)) && !request.is_form_encoded() {
            return Err(OAuth1Error::InvalidRequest(
                "form body requires an application/x-www-form-urlencoded content type"
                    .to_string(),
            ));
        }

        let oauth_params = self.oauth_params();

        // Signable parameters: everything on the request plus the protocol
        // params being added now.
        let mut signable = collect_parameters(request, false)?;
        signable.extend(oauth_params.iter().cloned());

        let base_uri = normalize_base_string_uri(&request.uri, None)?;
        let normalized = normalize_parameters(&signable);
        let base_string = signature_base_string(&request.method, &base_uri, &normalized);

        let credentials = SigningCredentials {
            client_secret: self.client_secret.clone(),
            resource_owner_secret: self.resource_owner_secret.clone(),
            rsa_key: self.rsa_key.clone(),
        };
        let signature = self
            .registry
            .sign(&self.signature_method, &base_string, &credentials)?;
        debug!(
            method = %self.signature_method,
            placement = ?self.placement,
            "signed request"
        );

        let mut signed_params = oauth_params;
        signed_params.push(("oauth_signature".to_string(), signature));

        let mut signed = request.clone();
        match self.placement {
            SignaturePlacement::AuthHeader => {
                let header =
                    format_authorization_header(&signed_params, self.realm.as_deref());
                signed.headers.push(("Authorization".to_string(), header));
            }
            SignaturePlacement::Query => {
                let extra = encode_form(
                    signed_params
                        .iter()
                        .map(|(k, v)| (Cow::from(k.as_str()), Cow::from(v.as_str()))),
                );
                let separator = if signed.uri.contains('?') { '&' } else { '?' };
                signed.uri = format!("{}{}{}", signed.uri, separator, extra);
            }
            SignaturePlacement::Body => {
                let mut pairs = match signed.body {
                    Body::Form(pairs) => pairs,
                    Body::Empty => Vec::new(),
                    Body::Raw(_) => {
                        return Err(OAuth1Error::InvalidRequest(
                            "cannot place oauth parameters into a raw body".to_string(),
                        ));
                    }
                };
                pairs.extend(signed_params);
                signed.body = Body::Form(pairs);
                if !signed.is_form_encoded() {
                    signed.headers.push((
                        "Content-Type".to_string(),
                        crate::http::FORM_URLENCODED.to_string(),
                    ));
                }
            }
        }
        Ok(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_client() -> Client {
        Client::new("client_key_000000000")
            .with_client_secret("client_secret")
            .with_resource_owner("token_000000000", "token_secret")
    }

    #[test]
    fn header_placement_emits_oauth_header() {
        let request = Request::new("GET", "https://example.com/resource?a=1");
        let signed = basic_client().sign(&request).unwrap();
        let header = signed.header("Authorization").unwrap();
        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_consumer_key=\"client_key_000000000\""));
        assert!(header.contains("oauth_token=\"token_000000000\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.contains("oauth_signature=\""));
        assert!(header.contains("oauth_version=\"1.0\""));
    }

    #[test]
    fn realm_leads_the_header_but_is_not_signed() {
        let request = Request::new("GET", "https://example.com/resource");
        let with_realm = basic_client()
            .with_realm("photos")
            .with_fixed_timestamp_nonce(1_234_567_890, "fixednonce")
            .sign(&request)
            .unwrap();
        let without_realm = basic_client()
            .with_fixed_timestamp_nonce(1_234_567_890, "fixednonce")
            .sign(&request)
            .unwrap();
        let h1 = with_realm.header("Authorization").unwrap();
        let h2 = without_realm.header("Authorization").unwrap();
        assert!(h1.starts_with("OAuth realm=\"photos\", "));
        // Identical signatures prove realm stayed out of the base string
        let sig = |h: &str| {
            h.split("oauth_signature=\"")
                .nth(1)
                .unwrap()
                .split('"')
                .next()
                .unwrap()
                .to_string()
        };
        assert_eq!(sig(h1), sig(h2));
    }

    #[test]
    fn query_placement_appends_params() {
        let request = Request::new("GET", "https://example.com/resource?a=1");
        let signed = basic_client()
            .with_placement(SignaturePlacement::Query)
            .sign(&request)
            .unwrap();
        assert!(signed.uri.contains("a=1&"));
        assert!(signed.uri.contains("oauth_signature="));
        assert!(signed.header("Authorization").is_none());
    }

    #[test]
    fn body_placement_extends_form() {
        let request = Request::new("POST", "https://example.com/resource")
            .with_form_body(vec![("status".to_string(), "hello".to_string())]);
        let signed = basic_client()
            .with_placement(SignaturePlacement::Body)
            .sign(&request)
            .unwrap();
        let pairs = signed.body_pairs().unwrap();
        assert!(pairs.iter().any(|(k, _)| k == "status"));
        assert!(pairs.iter().any(|(k, _)| k == "oauth_signature"));
    }

    #[test]
    fn get_with_body_is_rejected() {
        let request = Request::new("GET", "https://example.com/resource")
            .with_form_body(vec![("a".to_string(), "b".to_string())]);
        let err = basic_client().sign(&request).unwrap_err();
        assert!(matches!(err, OAuth1Error::InvalidRequest(_)));

        let request = Request::new("HEAD", "https://example.com/resource")
            .with_raw_body(b"x".to_vec());
        assert!(basic_client().sign(&request).is_err());
    }

    #[test]
    fn form_body_without_content_type_is_rejected() {
        let mut request = Request::new("POST", "https://example.com/resource");
        request.body = Body::Form(vec![("a".to_string(), "b".to_string())]);
        assert!(basic_client().sign(&request).is_err());
    }

    #[test]
    fn fixed_timestamp_and_nonce_make_signing_deterministic() {
        let request = Request::new("GET", "https://example.com/resource");
        let client = basic_client().with_fixed_timestamp_nonce(1_318_622_958, "abc123");
        let first = client.sign(&request).unwrap();
        let second = client.sign(&request).unwrap();
        assert_eq!(
            first.header("Authorization"),
            second.header("Authorization")
        );
    }

    #[test]
    fn callback_and_verifier_are_included_when_set() {
        let request = Request::new("POST", "https://example.com/access_token");
        let signed = basic_client()
            .with_callback("https://client.example/cb")
            .with_verifier("verif123")
            .sign(&request)
            .unwrap();
        let header = signed.header("Authorization").unwrap();
        assert!(header.contains("oauth_callback="));
        assert!(header.contains("oauth_verifier=\"verif123\""));
    }
}
