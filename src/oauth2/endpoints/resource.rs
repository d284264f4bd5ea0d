//! Protected resource verification for OAuth2 bearer tokens.

use std::sync::Arc;

use tracing::debug;

use crate::http::Request;

use crate::oauth2::context::ValidationContext;
use crate::oauth2::request_validator::RequestValidator;
use crate::oauth2::tokens::BearerTokenHandler;

/// Checks incoming resource requests for a bearer token valid for the
/// required scopes.
pub struct ResourceEndpoint {
    tokens: BearerTokenHandler,
}

impl ResourceEndpoint {
    /// Endpoint backed by the given validator
    #[must_use]
    pub fn new(validator: Arc<dyn RequestValidator>) -> Self {
        Self {
            tokens: BearerTokenHandler::new(validator),
        }
    }

    /// Whether `request` carries a token valid for `required_scopes`.
    ///
    /// Returns the verdict together with whatever the validator
    /// established about the caller (client, user, granted scopes), since
    /// resource servers usually need both.
    #[must_use]
    pub fn verify_request(
        &self,
        request: &Request,
        required_scopes: &[String],
    ) -> (bool, ValidationContext) {
        let mut ctx = ValidationContext::new();
        let valid = self.tokens.validate_request(request, required_scopes, &mut ctx);
        debug!(valid, scopes = ?required_scopes, "verified resource request");
        (valid, ctx)
    }
}
