//! MAC access token authentication (draft-ietf-oauth-v2-http-mac).
//!
//! Two wire generations are supported. Draft 00 sends an age-prefixed
//! nonce and an optional body hash; draft 01 and later send a separate
//! timestamp and a plain nonce and drop the body hash entirely.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use url::Url;

use crate::generate::{random_nonce, unix_timestamp};
use crate::http::{Body, Request};

use crate::oauth2::errors::OAuth2Error;

/// Which revision of the MAC draft the header should follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacDraft {
    /// Draft 00: `nonce="age:random"`, optional `bodyhash`, no `ts`
    Draft00,
    /// Draft 01 and later: separate `ts` and `nonce`, no `bodyhash`
    Draft01,
}

/// MAC computation algorithm, as negotiated at token issuance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacAlgorithm {
    /// `hmac-sha-1`
    HmacSha1,
    /// `hmac-sha-256`
    HmacSha256,
}

impl MacAlgorithm {
    /// Parse the registered algorithm name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "hmac-sha-1" => Some(Self::HmacSha1),
            "hmac-sha-256" => Some(Self::HmacSha256),
            _ => None,
        }
    }

    /// The registered algorithm name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::HmacSha1 => "hmac-sha-1",
            Self::HmacSha256 => "hmac-sha-256",
        }
    }
}

/// The MAC key material issued alongside the access token
#[derive(Debug, Clone)]
pub struct MacCredentials {
    /// The access token identifier (`id` in the header)
    pub token: String,
    /// The shared MAC session key
    pub key: String,
    /// Algorithm both sides agreed on
    pub algorithm: MacAlgorithm,
}

/// Builds `Authorization: MAC …` headers for outgoing requests
#[derive(Debug, Clone)]
pub struct MacTokenHandler {
    credentials: MacCredentials,
    draft: MacDraft,
    /// Unix time the token was issued, used for the draft-00 age prefix
    issued_at: u64,
    ext: Option<String>,
    fixed: Option<(u64, String)>,
}

impl MacTokenHandler {
    /// Handler for the given credentials and draft revision.
    ///
    /// `issued_at` is the Unix time the token was issued; draft 00 encodes
    /// the elapsed seconds since then into the nonce.
    #[must_use]
    pub fn new(credentials: MacCredentials, draft: MacDraft, issued_at: u64) -> Self {
        Self {
            credentials,
            draft,
            issued_at,
            ext: None,
            fixed: None,
        }
    }

    /// Attach an application-specific `ext` value
    #[must_use]
    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }

    /// Pin timestamp and nonce for reproducible output
    #[must_use]
    pub fn with_fixed_timestamp_nonce(mut self, timestamp: u64, nonce: impl Into<String>) -> Self {
        self.fixed = Some((timestamp, nonce.into()));
        self
    }

    /// Compute the full `Authorization` header value for `request`
    pub fn authorization_header(&self, request: &Request) -> Result<String, OAuth2Error> {
        let (timestamp, nonce) = match &self.fixed {
            Some((ts, n)) => (*ts, n.clone()),
            None => (unix_timestamp(), random_nonce()),
        };

        let url = Url::parse(&request.uri)
            .map_err(|e| OAuth2Error::invalid_request(format!("unparseable request URI: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| OAuth2Error::invalid_request("request URI has no host"))?
            .to_string();
        let port = match url.port() {
            Some(p) => p,
            None if url.scheme() == "https" => 443,
            None => 80,
        };
        let mut request_uri = url.path().to_string();
        if let Some(query) = url.query() {
            request_uri.push('?');
            request_uri.push_str(query);
        }

        // Draft 00 folds the token age into the nonce.
        let wire_nonce = match self.draft {
            MacDraft::Draft00 => {
                let age = timestamp.saturating_sub(self.issued_at);
                format!("{age}:{nonce}")
            }
            MacDraft::Draft01 => nonce,
        };

        let bodyhash = match (self.draft, &request.body) {
            (MacDraft::Draft00, Body::Form(_) | Body::Raw(_)) => {
                Some(self.hash_body(&request.body_bytes()))
            }
            _ => None,
        };

        let mut base = Vec::new();
        match self.draft {
            MacDraft::Draft00 => base.push(wire_nonce.clone()),
            MacDraft::Draft01 => {
                base.push(timestamp.to_string());
                base.push(wire_nonce.clone());
            }
        }
        base.push(request.method.to_uppercase());
        base.push(request_uri);
        base.push(host);
        base.push(port.to_string());
        if self.draft == MacDraft::Draft00 {
            base.push(bodyhash.clone().unwrap_or_default());
        }
        base.push(self.ext.clone().unwrap_or_default());

        let base_string = format!("{}\n", base.join("\n"));
        let mac = self.compute(&base_string)?;

        let mut parts = vec![format!("id=\"{}\"", self.credentials.token)];
        if self.draft == MacDraft::Draft01 {
            parts.push(format!("ts=\"{timestamp}\""));
        }
        parts.push(format!("nonce=\"{wire_nonce}\""));
        if let Some(hash) = bodyhash {
            parts.push(format!("bodyhash=\"{hash}\""));
        }
        if let Some(ext) = &self.ext {
            parts.push(format!("ext=\"{ext}\""));
        }
        parts.push(format!("mac=\"{mac}\""));

        Ok(format!("MAC {}", parts.join(", ")))
    }

    /// Return `request` with the computed header attached
    pub fn sign(&self, request: Request) -> Result<Request, OAuth2Error> {
        let header = self.authorization_header(&request)?;
        Ok(request.with_header("Authorization", header))
    }

    fn hash_body(&self, body: &[u8]) -> String {
        match self.credentials.algorithm {
            MacAlgorithm::HmacSha1 => STANDARD.encode(Sha1::digest(body)),
            MacAlgorithm::HmacSha256 => STANDARD.encode(Sha256::digest(body)),
        }
    }

    fn compute(&self, base_string: &str) -> Result<String, OAuth2Error> {
        let key = self.credentials.key.as_bytes();
        let digest = match self.credentials.algorithm {
            MacAlgorithm::HmacSha1 => {
                let mut mac = Hmac::<Sha1>::new_from_slice(key)
                    .map_err(|e| OAuth2Error::invalid_request(format!("MAC key error: {e}")))?;
                mac.update(base_string.as_bytes());
                mac.finalize().into_bytes().to_vec()
            }
            MacAlgorithm::HmacSha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(key)
                    .map_err(|e| OAuth2Error::invalid_request(format!("MAC key error: {e}")))?;
                mac.update(base_string.as_bytes());
                mac.finalize().into_bytes().to_vec()
            }
        };
        Ok(STANDARD.encode(digest))
    }
}
