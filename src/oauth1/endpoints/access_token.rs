//! Token credential (access token) issuance (RFC 5849 §2.3).

use std::borrow::Cow;
use std::sync::Arc;

use tracing::info;

use crate::generate::random_token;
use crate::http::{Request, ResponseParts, encode_form};

use super::{BaseEndpoint, TokenKind};
use crate::oauth1::errors::OAuth1Error;
use crate::oauth1::signature::SignatureMethodRegistry;
use crate::oauth1::validator::{RequestValidator, TokenCredentials};

/// Exchanges an authorized request token plus verifier for an access token
pub struct AccessTokenEndpoint {
    base: BaseEndpoint,
}

impl AccessTokenEndpoint {
    /// Build with the standard signature methods
    #[must_use]
    pub fn new(validator: Arc<dyn RequestValidator>) -> Self {
        Self {
            base: BaseEndpoint::new(validator),
        }
    }

    /// Replace the signature method registry
    #[must_use]
    pub fn with_registry(mut self, registry: SignatureMethodRegistry) -> Self {
        self.base.registry = registry;
        self
    }

    /// Validate the exchange request and issue an access token.
    ///
    /// Failures come back as a 400/401 wire response, never as an `Err`.
    #[must_use]
    pub fn create_access_token_response(&self, request: &Request) -> ResponseParts {
        match self.try_create(request) {
            Ok(response) => response,
            Err(e) => e.to_response(),
        }
    }

    fn try_create(&self, request: &Request) -> Result<ResponseParts, OAuth1Error> {
        self.base.check_transport(request)?;
        let params = self.base.extract_parameters(request)?;
        self.base.check_signature_method(&params)?;
        self.base.check_client_key_shape(&params)?;

        let token = params.token.clone().ok_or_else(|| {
            OAuth1Error::InvalidRequest("missing required parameter: oauth_token".to_string())
        })?;
        let verifier = params.verifier.clone().ok_or_else(|| {
            OAuth1Error::InvalidRequest("missing required parameter: oauth_verifier".to_string())
        })?;

        // Full verification pass first, then the verifier check against the
        // same (or dummy) token, so every branch does the same amount of work.
        let verification =
            self.base
                .verify_signature(request, &params, TokenKind::Request(&token))?;
        let verifier_token = if verification.token_ok {
            token.clone()
        } else {
            self.base.validator.dummy_request_token()
        };
        let verifier_ok = self.base.validator.validate_verifier(
            &params.consumer_key,
            &verifier_token,
            &verifier,
        );

        if !verification.client_ok || !verification.signature_ok {
            return Err(OAuth1Error::InvalidClient(
                "access token request failed verification".to_string(),
            ));
        }
        if !verification.nonce_ok {
            return Err(OAuth1Error::InvalidNonce(
                "timestamp/nonce combination rejected".to_string(),
            ));
        }
        if !verification.token_ok {
            return Err(OAuth1Error::InvalidToken(
                "unknown or expired request token".to_string(),
            ));
        }
        if !verifier_ok {
            return Err(OAuth1Error::InvalidVerifier(
                "verifier does not match the request token".to_string(),
            ));
        }

        let access = TokenCredentials {
            key: random_token(24),
            secret: random_token(32),
        };
        self.base
            .validator
            .save_access_token(&params.consumer_key, &access);
        info!(client = %params.consumer_key, "issued access token");

        let body = encode_form([
            (Cow::Borrowed("oauth_token"), Cow::from(access.key)),
            (Cow::Borrowed("oauth_token_secret"), Cow::from(access.secret)),
        ]);
        Ok(ResponseParts::form(200, body))
    }
}
