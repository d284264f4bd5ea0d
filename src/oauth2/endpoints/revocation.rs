//! Token revocation endpoint (RFC 7009).

use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::http::{Request, ResponseParts};

use crate::oauth2::errors::{ErrorKind, OAuth2Error};
use crate::oauth2::grants::authenticate_token_client;
use crate::oauth2::context::ValidationContext;
use crate::oauth2::request_validator::RequestValidator;

use super::guard::EndpointGuard;

/// Accepts revocation requests and forwards them to the validator.
///
/// Revocation is idempotent: revoking an unknown or already-revoked token
/// still answers `200`, so callers learn nothing about token existence.
pub struct RevocationEndpoint {
    validator: Arc<dyn RequestValidator>,
    guard: EndpointGuard,
    enable_jsonp: bool,
}

impl RevocationEndpoint {
    /// Endpoint backed by the given validator
    #[must_use]
    pub fn new(validator: Arc<dyn RequestValidator>) -> Self {
        Self {
            validator,
            guard: EndpointGuard::new(),
            enable_jsonp: false,
        }
    }

    /// Allow JSONP (`callback` parameter) responses
    #[must_use]
    pub fn with_jsonp(mut self) -> Self {
        self.enable_jsonp = true;
        self
    }

    /// Replace the guard policy
    #[must_use]
    pub fn with_guard(mut self, guard: EndpointGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Handle a revocation request
    pub fn create_revocation_response(&self, request: &Request) -> Result<ResponseParts> {
        self.guard.run(|| {
            let callback = if self.enable_jsonp {
                request.param("callback")
            } else {
                None
            };
            match self.try_revoke(request) {
                Ok(()) => Ok(match callback {
                    Some(cb) => ResponseParts::json(200, format!("{cb}()")),
                    None => ResponseParts::empty(200),
                }),
                Err(crate::error::Error::OAuth2(e)) => Ok(match callback {
                    Some(cb) => {
                        ResponseParts::json(200, format!("{cb}({})", e.json_body()))
                    }
                    None => e.to_json_response(),
                }),
                Err(other) => Err(other),
            }
        })
    }

    fn try_revoke(&self, request: &Request) -> Result<()> {
        let mut ctx = ValidationContext::new();
        authenticate_token_client(&self.validator, request, &mut ctx)
            .map_err(crate::error::Error::OAuth2)?;

        let token = request.param("token").ok_or_else(|| {
            crate::error::Error::OAuth2(OAuth2Error::invalid_request(
                "token parameter required",
            ))
        })?;

        let hint = request.param("token_type_hint");
        if let Some(hint) = &hint {
            if !self
                .validator
                .get_revocable_token_types()
                .iter()
                .any(|t| t == hint)
            {
                return Err(crate::error::Error::OAuth2(
                    OAuth2Error::new(ErrorKind::UnsupportedTokenType)
                        .with_description(format!("cannot revoke tokens of type {hint:?}")),
                ));
            }
        }

        // Unknown tokens are not reported; the validator treats them as
        // already revoked.
        self.validator.revoke_token(&token, hint.as_deref())?;
        info!(client = ?ctx.client_id, "processed revocation request");
        Ok(())
    }
}
