//! Resource owner password credentials grant (RFC 6749 §4.3).

use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result};
use crate::http::{Request, ResponseParts};

use crate::oauth2::context::ValidationContext;
use crate::oauth2::errors::{ErrorKind, OAuth2Error};
use crate::oauth2::request_validator::RequestValidator;
use crate::oauth2::tokens::{BearerTokenHandler, token_json};

use super::{GrantType, authenticate_token_client, reject_duplicates, resolve_scopes};

/// The password grant.
///
/// Depends on the validator's [`RequestValidator::validate_user`]
/// capability; deployments that leave it unimplemented get a
/// configuration error out of the endpoint rather than a protocol error
/// to the client.
pub struct PasswordGrant {
    validator: Arc<dyn RequestValidator>,
}

impl PasswordGrant {
    /// Grant backed by the given validator
    #[must_use]
    pub fn new(validator: Arc<dyn RequestValidator>) -> Self {
        Self { validator }
    }
}

impl GrantType for PasswordGrant {
    fn name(&self) -> &'static str {
        "password"
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

impl PasswordGrant {
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

        let username = request
            .param("username")
            .ok_or_else(|| Error::OAuth2(OAuth2Error::invalid_request("username required")))?;
        let password = request
            .param("password")
            .ok_or_else(|| Error::OAuth2(OAuth2Error::invalid_request("password required")))?;

        // A missing capability propagates as Err, not as a client-visible
        // protocol error.
        if !self.validator.validate_user(&username, &password, ctx)? {
            return Err(Error::OAuth2(OAuth2Error::invalid_grant(
                "resource owner credentials rejected",
            )));
        }

        resolve_scopes(&*self.validator, request, ctx).map_err(Error::OAuth2)?;
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
        info!(client = %client_id, "issued password-grant token");
        Ok(ResponseParts::json(200, token_json(&token)))
    }
}
