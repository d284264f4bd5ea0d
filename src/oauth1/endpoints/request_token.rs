//! Temporary credential (request token) issuance (RFC 5849 §2.1).

use std::borrow::Cow;
use std::sync::Arc;

use tracing::info;

use crate::generate::random_token;
use crate::http::{Request, ResponseParts, encode_form};

use super::{BaseEndpoint, TokenKind};
use crate::oauth1::errors::OAuth1Error;
use crate::oauth1::signature::SignatureMethodRegistry;
use crate::oauth1::validator::{RequestValidator, TokenCredentials};

/// Issues request tokens to clients that present a valid signed request
pub struct RequestTokenEndpoint {
    base: BaseEndpoint,
}

impl RequestTokenEndpoint {
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

    /// Validate the request and issue a request token.
    ///
    /// Never propagates protocol errors; failures come back as a 400/401
    /// wire response.
    #[must_use]
    pub fn create_request_token_response(&self, request: &Request) -> ResponseParts {
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

        // Endpoint-specific: callback presence and realm policy
        let callback = params.callback.clone().ok_or_else(|| {
            OAuth1Error::InvalidRequest("missing required parameter: oauth_callback".to_string())
        })?;
        if callback != "oob"
            && !self
                .base
                .validator
                .validate_redirect_uri(&params.consumer_key, &callback)
        {
            return Err(OAuth1Error::InvalidRequest(format!(
                "callback URI not allowed: {callback}"
            )));
        }
        if !self
            .base
            .validator
            .validate_requested_realms(&params.consumer_key, &params.realms())
        {
            return Err(OAuth1Error::InvalidRequest(
                "requested realm not allowed for this client".to_string(),
            ));
        }

        let verification = self
            .base
            .verify_signature(request, &params, TokenKind::None)?;
        if !verification.all_ok() {
            return Err(OAuth1Error::InvalidClient(
                "request token request failed verification".to_string(),
            ));
        }

        let token = TokenCredentials {
            key: random_token(24),
            secret: random_token(32),
        };
        self.base
            .validator
            .save_request_token(&params.consumer_key, &token, &callback);
        info!(client = %params.consumer_key, "issued request token");

        let body = encode_form([
            (Cow::Borrowed("oauth_token"), Cow::from(token.key)),
            (Cow::Borrowed("oauth_token_secret"), Cow::from(token.secret)),
            (Cow::Borrowed("oauth_callback_confirmed"), Cow::Borrowed("true")),
        ]);
        Ok(ResponseParts::form(200, body))
    }
}
