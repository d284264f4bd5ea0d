//! Resource-owner authorization (RFC 5849 §2.2).
//!
//! The resource owner has already been authenticated by the host
//! application by the time this endpoint runs; its job is only to mint a
//! verifier for an existing request token and send the owner back to the
//! client.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::info;

use crate::generate::random_token;
use crate::http::{Request, ResponseParts, encode_form};

use crate::oauth1::errors::OAuth1Error;
use crate::oauth1::validator::RequestValidator;

/// Issues verifiers bound to authorized request tokens
pub struct AuthorizationEndpoint {
    validator: Arc<dyn RequestValidator>,
}

impl AuthorizationEndpoint {
    /// Create the endpoint
    #[must_use]
    pub fn new(validator: Arc<dyn RequestValidator>) -> Self {
        Self { validator }
    }

    /// Mint a verifier for the `oauth_token` named by the request and
    /// produce the response that returns the owner to the client: a 302 to
    /// the recorded callback, or a 200 page body for out-of-band clients.
    #[must_use]
    pub fn create_authorization_response(&self, request: &Request) -> ResponseParts {
        match self.try_create(request) {
            Ok(response) => response,
            Err(e) => e.to_response(),
        }
    }

    fn try_create(&self, request: &Request) -> Result<ResponseParts, OAuth1Error> {
        let token = request.param("oauth_token").ok_or_else(|| {
            OAuth1Error::InvalidRequest("missing required parameter: oauth_token".to_string())
        })?;
        if !self.validator.verify_request_token(&token) {
            return Err(OAuth1Error::InvalidToken(
                "unknown or expired request token".to_string(),
            ));
        }

        let verifier = random_token(24);
        self.validator.save_verifier(&token, &verifier);
        info!("issued verifier for request token");

        let pairs = [
            (Cow::Borrowed("oauth_token"), Cow::from(token.clone())),
            (Cow::Borrowed("oauth_verifier"), Cow::from(verifier)),
        ];
        match self.validator.get_redirect_uri(&token).as_deref() {
            None | Some("oob") => Ok(ResponseParts::form(200, encode_form(pairs))),
            Some(callback) => {
                let separator = if callback.contains('?') { '&' } else { '?' };
                Ok(ResponseParts::redirect(format!(
                    "{callback}{separator}{}",
                    encode_form(pairs)
                )))
            }
        }
    }
}
