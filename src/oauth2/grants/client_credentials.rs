//! Client credentials grant (RFC 6749 §4.4): the client is the resource
//! owner. Always requires authentication; never issues a refresh token.

use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result};
use crate::http::{Request, ResponseParts};

use crate::oauth2::context::ValidationContext;
use crate::oauth2::errors::{ErrorKind, OAuth2Error};
use crate::oauth2::request_validator::RequestValidator;
use crate::oauth2::tokens::{BearerTokenHandler, token_json};

use super::{GrantType, reject_duplicates, resolve_scopes};

/// The client credentials grant
pub struct ClientCredentialsGrant {
    validator: Arc<dyn RequestValidator>,
}

impl ClientCredentialsGrant {
    /// Grant backed by the given validator
    #[must_use]
    pub fn new(validator: Arc<dyn RequestValidator>) -> Self {
        Self { validator }
    }
}

impl GrantType for ClientCredentialsGrant {
    fn name(&self) -> &'static str {
        "client_credentials"
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

impl ClientCredentialsGrant {
    /// The lookup-only prefix of the token leg
    fn validate_token(
        &self,
        request: &Request,
        ctx: &mut ValidationContext,
    ) -> Result<()> {
        reject_duplicates(request).map_err(Error::OAuth2)?;

        // Public clients are excluded from this grant outright.
        if !self.validator.authenticate_client(request, ctx) {
            return Err(Error::OAuth2(OAuth2Error::invalid_client(
                "client authentication failed",
            )));
        }
        ctx.client_authenticated = true;
        let client_id = ctx.client_id.clone().unwrap_or_default();

        if !self.validator.validate_grant_type(&client_id, self.name()) {
            return Err(Error::OAuth2(OAuth2Error::new(ErrorKind::UnauthorizedClient)));
        }
        ctx.grant_type = Some(self.name().to_string());

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

        // RFC 6749 §4.4.3: no refresh token with this grant.
        let token = tokens.create_token(request, ctx, false);
        info!(client = %client_id, "issued client-credentials token");
        Ok(ResponseParts::json(200, token_json(&token)))
    }
}
