//! Signature methods: HMAC-SHA1, RSA-SHA1, PLAINTEXT (RFC 5849 §3.4).
//!
//! Methods are looked up by their case-sensitive wire token through a
//! [`SignatureMethodRegistry`]. The registry is an owned value seeded with
//! the three standard methods; custom methods are registered before the
//! registry is handed to a client or endpoint, so concurrent use is
//! read-only by construction.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use super::encode::percent_encode;
use super::errors::OAuth1Error;

/// Wire token for HMAC-SHA1
pub const HMAC_SHA1: &str = "HMAC-SHA1";
/// Wire token for RSA-SHA1
pub const RSA_SHA1: &str = "RSA-SHA1";
/// Wire token for PLAINTEXT
pub const PLAINTEXT: &str = "PLAINTEXT";

/// Secrets a signer may draw on.
///
/// The same bundle serves both sides: a client signs with its own secrets,
/// a server recomputes with looked-up (or dummy) secrets.
#[derive(Debug, Clone, Default)]
pub struct SigningCredentials {
    /// Client (consumer) secret
    pub client_secret: Option<String>,
    /// Token secret of the resource owner credentials in play
    pub resource_owner_secret: Option<String>,
    /// PEM-encoded RSA private key (PKCS#1 or PKCS#8), RSA-SHA1 only
    pub rsa_key: Option<String>,
}

/// Signing function for a single method
pub type SignerFn =
    Arc<dyn Fn(&str, &SigningCredentials) -> Result<String, OAuth1Error> + Send + Sync>;

/// The shared HMAC/PLAINTEXT key: `enc(client_secret)&enc(token_secret)`
fn shared_key(credentials: &SigningCredentials) -> String {
    format!(
        "{}&{}",
        percent_encode(credentials.client_secret.as_deref().unwrap_or("")),
        percent_encode(credentials.resource_owner_secret.as_deref().unwrap_or(""))
    )
}

/// HMAC-SHA1 over the base string, base64-encoded
pub fn sign_hmac_sha1(
    base_string: &str,
    credentials: &SigningCredentials,
) -> Result<String, OAuth1Error> {
    let key = shared_key(credentials);
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| OAuth1Error::InvalidRequest(format!("HMAC key error: {e}")))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// PLAINTEXT signature: the shared key itself, base string ignored.
///
/// Only safe over a confidential transport; endpoint policy decides whether
/// to allow it at all.
#[must_use]
pub fn sign_plaintext(credentials: &SigningCredentials) -> String {
    shared_key(credentials)
}

fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, OAuth1Error> {
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| OAuth1Error::InvalidRequest(format!("invalid RSA private key: {e}")))
}

/// RSASSA-PKCS1-v1_5 with SHA-1 over the base string, base64-encoded
pub fn sign_rsa_sha1(
    base_string: &str,
    credentials: &SigningCredentials,
) -> Result<String, OAuth1Error> {
    let pem = credentials.rsa_key.as_deref().ok_or_else(|| {
        OAuth1Error::InvalidRequest("RSA-SHA1 requires an rsa_key credential".to_string())
    })?;
    let key = parse_private_key(pem)?;
    let digest = Sha1::digest(base_string.as_bytes());
    let signature = key
        .sign(Pkcs1v15Sign::new::<Sha1>(), &digest)
        .map_err(|e| OAuth1Error::InvalidRequest(format!("RSA signing failed: {e}")))?;
    Ok(STANDARD.encode(signature))
}

/// Verify an RSA-SHA1 signature against a PEM public key (or a private key,
/// from which the public half is derived).
pub fn verify_rsa_sha1(
    base_string: &str,
    key_pem: &str,
    signature_b64: &str,
) -> Result<bool, OAuth1Error> {
    let public_key = RsaPublicKey::from_public_key_pem(key_pem)
        .or_else(|_| parse_private_key(key_pem).map(|k| RsaPublicKey::from(&k)))
        .map_err(|e| OAuth1Error::InvalidRequest(format!("invalid RSA key: {e}")))?;
    let Ok(signature) = STANDARD.decode(signature_b64) else {
        return Ok(false);
    };
    let digest = Sha1::digest(base_string.as_bytes());
    Ok(public_key
        .verify(Pkcs1v15Sign::new::<Sha1>(), &digest, &signature)
        .is_ok())
}

/// Compare two signature strings in constant time
#[must_use]
pub fn signatures_match(supplied: &str, computed: &str) -> bool {
    supplied.as_bytes().ct_eq(computed.as_bytes()).into()
}

/// Registry mapping signature-method wire tokens to signing functions
#[derive(Clone)]
pub struct SignatureMethodRegistry {
    methods: HashMap<String, SignerFn>,
}

impl fmt::Debug for SignatureMethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("SignatureMethodRegistry")
            .field("methods", &names)
            .finish()
    }
}

impl Default for SignatureMethodRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl SignatureMethodRegistry {
    /// Registry seeded with the three RFC 5849 methods
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self {
            methods: HashMap::new(),
        };
        registry.register(HMAC_SHA1, Arc::new(sign_hmac_sha1));
        registry.register(RSA_SHA1, Arc::new(sign_rsa_sha1));
        registry.register(PLAINTEXT, Arc::new(|_base, creds| Ok(sign_plaintext(creds))));
        registry
    }

    /// Register a custom method under its case-sensitive wire token.
    ///
    /// Intended for process start-up, before the registry is shared.
    pub fn register(&mut self, name: impl Into<String>, signer: SignerFn) {
        self.methods.insert(name.into(), signer);
    }

    /// Whether `name` resolves to a registered method
    #[must_use]
    pub fn supports(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Sign a base string with the named method
    pub fn sign(
        &self,
        method: &str,
        base_string: &str,
        credentials: &SigningCredentials,
    ) -> Result<String, OAuth1Error> {
        let signer = self
            .methods
            .get(method)
            .ok_or_else(|| OAuth1Error::InvalidSignatureMethod(method.to_string()))?;
        signer(base_string, credentials)
    }
}
