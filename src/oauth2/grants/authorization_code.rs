//! Authorization code grant (RFC 6749 §4.1): the two-leg web flow.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::generate::random_token;
use crate::http::{Request, ResponseParts};

use crate::oauth2::context::ValidationContext;
use crate::oauth2::errors::{ErrorKind, OAuth2Error};
use crate::oauth2::request_validator::{AuthorizationCode, RequestValidator};
use crate::oauth2::tokens::{BearerTokenHandler, token_json};

use super::{
    GrantType, add_params_to_uri, authenticate_token_client, reject_duplicates,
    resolve_client_and_redirect, resolve_scopes,
};

/// Bytes of entropy per authorization code
const CODE_BYTES: usize = 24;

/// The authorization code grant.
///
/// The authorization leg hands the resource owner's approval back as a
/// short-lived code in the redirect query; the token leg exchanges that
/// code, exactly once, for a token pair.
pub struct AuthorizationCodeGrant {
    validator: Arc<dyn RequestValidator>,
}

impl AuthorizationCodeGrant {
    /// Grant backed by the given validator
    #[must_use]
    pub fn new(validator: Arc<dyn RequestValidator>) -> Self {
        Self { validator }
    }

    /// The normal phase: everything that may fail *after* the redirect URI
    /// has been established as trustworthy.
    fn validate_post_redirect(
        &self,
        request: &Request,
        ctx: &mut ValidationContext,
    ) -> std::result::Result<(), OAuth2Error> {
        reject_duplicates(request).map_err(|e| e.with_state(ctx.state.clone()))?;

        let client_id = ctx.client_id.clone().unwrap_or_default();
        let response_type = request
            .param("response_type")
            .ok_or_else(|| {
                OAuth2Error::invalid_request("response_type required")
                    .with_state(ctx.state.clone())
            })?;
        if response_type != "code" {
            return Err(OAuth2Error::new(ErrorKind::UnsupportedResponseType)
                .with_state(ctx.state.clone()));
        }
        if !self.validator.validate_response_type(&client_id, &response_type) {
            return Err(OAuth2Error::new(ErrorKind::UnauthorizedClient)
                .with_state(ctx.state.clone()));
        }
        ctx.response_type = Some(response_type);

        resolve_scopes(&*self.validator, request, ctx)?;
        Ok(())
    }
}

impl GrantType for AuthorizationCodeGrant {
    fn name(&self) -> &'static str {
        "authorization_code"
    }

    fn validate_authorization_request(&self, request: &Request) -> Result<ValidationContext> {
        let mut ctx = ValidationContext::new();
        resolve_client_and_redirect(&*self.validator, request, &mut ctx)?;
        self.validate_post_redirect(request, &mut ctx)
            .map_err(Error::OAuth2)?;
        Ok(ctx)
    }

    fn create_authorization_response(
        &self,
        request: &Request,
        _tokens: &BearerTokenHandler,
    ) -> Result<ResponseParts> {
        let mut ctx = ValidationContext::new();
        // Fatal phase: a failure here must never become a redirect.
        resolve_client_and_redirect(&*self.validator, request, &mut ctx)?;
        let redirect_uri = ctx
            .redirect_uri
            .clone()
            .unwrap_or_default();

        match self.validate_post_redirect(request, &mut ctx) {
            Ok(()) => {
                let code = AuthorizationCode {
                    code: random_token(CODE_BYTES),
                    redirect_uri: request.param("redirect_uri"),
                    scopes: ctx.scopes.clone(),
                    state: ctx.state.clone(),
                };
                let client_id = ctx.client_id.clone().unwrap_or_default();
                self.validator
                    .save_authorization_code(&client_id, &code, request);
                info!(client = %client_id, "issued authorization code");

                let mut params = vec![("code".to_string(), code.code)];
                if let Some(state) = &ctx.state {
                    params.push(("state".to_string(), state.clone()));
                }
                let location = add_params_to_uri(&redirect_uri, &params, false)?;
                Ok(ResponseParts::redirect(location))
            }
            Err(e) => {
                debug!(error = %e, "authorization request rejected, redirecting error");
                let location = add_params_to_uri(&redirect_uri, &e.query_pairs(), false)?;
                Ok(ResponseParts::redirect(location))
            }
        }
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
        let outcome = self.try_token(request, tokens, &mut ctx);
        match outcome {
            Ok(response) => Ok(response),
            Err(Error::OAuth2(e)) => Ok(e.to_json_response()),
            Err(other) => Err(other),
        }
    }
}

impl AuthorizationCodeGrant {
    /// The lookup-only prefix of the token leg: everything up to, but not
    /// including, token creation and code invalidation.
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

        let code = request
            .param("code")
            .ok_or_else(|| Error::OAuth2(OAuth2Error::invalid_request("code required")))?;
        if !self.validator.validate_code(&client_id, &code, ctx) {
            return Err(Error::OAuth2(OAuth2Error::invalid_grant(
                "authorization code is invalid or expired",
            )));
        }
        ctx.code = Some(code.clone());

        let presented = request.param("redirect_uri");
        if !self
            .validator
            .confirm_redirect_uri(&client_id, &code, presented.as_deref())
        {
            return Err(Error::OAuth2(OAuth2Error::invalid_grant(
                "redirect_uri does not match the one the code was issued to",
            )));
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
        let code = ctx.code.clone().unwrap_or_default();

        let token = tokens.create_token(request, ctx, true);
        self.validator.invalidate_authorization_code(&client_id, &code);
        info!(client = %client_id, "exchanged authorization code");
        Ok(ResponseParts::json(200, token_json(&token)))
    }
}
