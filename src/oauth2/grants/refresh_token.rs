//! Refresh token grant (RFC 6749 §6).

use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result};
use crate::http::{Request, ResponseParts};

use crate::oauth2::context::{ValidationContext, parse_scope};
use crate::oauth2::errors::{ErrorKind, OAuth2Error};
use crate::oauth2::request_validator::RequestValidator;
use crate::oauth2::tokens::{BearerTokenHandler, token_json};

use super::{GrantType, authenticate_token_client, reject_duplicates};

/// The refresh token grant.
///
/// A refresh may narrow the granted scope but never widen it beyond what
/// was originally issued, unless the validator's
/// [`RequestValidator::is_within_original_scope`] escape hatch says
/// otherwise.
pub struct RefreshTokenGrant {
    validator: Arc<dyn RequestValidator>,
}

impl RefreshTokenGrant {
    /// Grant backed by the given validator
    #[must_use]
    pub fn new(validator: Arc<dyn RequestValidator>) -> Self {
        Self { validator }
    }
}

impl GrantType for RefreshTokenGrant {
    fn name(&self) -> &'static str {
        "refresh_token"
    }

    fn validate_token_request(&self, request: &Request) -> Result<ValidationContext> {
        let mut ctx = ValidationContext::new();
        self.validate_token(request, &mut ctx)?;
        Ok(ctx)
    }

    fn create_token_response(
        &self,
        request: &Request,
        tokens: &BearerTokenHandler,
    ) -> Result<ResponseParts> {
        let mut ctx = ValidationContext::new();
        match self.try_token(request, tokens, &mut ctx) {
            Ok(response) => Ok(response),
            Err(Error::OAuth2(e)) => Ok(e.to_json_response()),
            Err(other) => Err(other),
        }
    }
}

impl RefreshTokenGrant {
    /// The lookup-only prefix of the token leg
    fn validate_token(
        &self,
        request: &Request,
        ctx: &mut ValidationContext,
    ) -> Result<()> {
        reject_duplicates(request).map_err(Error::OAuth2)?;
        authenticate_token_client(&self.validator, request, ctx).map_err(Error::OAuth2)?;
        let client_id = ctx.client_id.clone().unwrap_or_default();

        if !self.validator.validate_grant_type(&client_id, self.name()) {
            return Err(Error::OAuth2(OAuth2Error::new(ErrorKind::UnauthorizedClient)));
        }
        ctx.grant_type = Some(self.name().to_string());

        let refresh_token = request.param("refresh_token").ok_or_else(|| {
            Error::OAuth2(OAuth2Error::invalid_request("refresh_token required"))
        })?;
        if !self.validator.validate_refresh_token(&refresh_token, ctx) {
            return Err(Error::OAuth2(OAuth2Error::invalid_grant(
                "refresh token is invalid or expired",
            )));
        }
        ctx.refresh_token = Some(refresh_token.clone());

        let original = self.validator.get_original_scopes(&refresh_token);
        match request.param("scope") {
            Some(raw) => {
                let requested = parse_scope(&raw);
                let within = requested.iter().all(|s| original.contains(s))
                    || self
                        .validator
                        .is_within_original_scope(&requested, &refresh_token);
                if !within {
                    return Err(Error::OAuth2(
                        OAuth2Error::new(ErrorKind::InvalidScope)
                            .with_description("scope exceeds the original grant"),
                    ));
                }
                ctx.requested_scopes = requested.clone();
                ctx.scopes = requested;
            }
            None => {
                ctx.scopes = original;
            }
        }
        Ok(())
    }

    fn try_token(
        &self,
        request: &Request,
        tokens: &BearerTokenHandler,
        ctx: &mut ValidationContext,
    ) -> Result<ResponseParts> {
        self.validate_token(request, ctx)?;
        let client_id = ctx.client_id.clone().unwrap_or_default();

        let token = tokens.create_token(request, ctx, true);
        info!(client = %client_id, "refreshed token");
        Ok(ResponseParts::json(200, token_json(&token)))
    }
}
