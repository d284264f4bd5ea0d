//! Implicit grant (RFC 6749 §4.2): token issued straight from the
//! authorization endpoint, carried in the fragment, never refreshable.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::http::{Request, ResponseParts};

use crate::oauth2::context::ValidationContext;
use crate::oauth2::errors::{ErrorKind, OAuth2Error};
use crate::oauth2::request_validator::RequestValidator;
use crate::oauth2::tokens::BearerTokenHandler;

use super::{
    GrantType, add_params_to_uri, reject_duplicates, resolve_client_and_redirect, resolve_scopes,
};

/// The implicit grant
pub struct ImplicitGrant {
    validator: Arc<dyn RequestValidator>,
}

impl ImplicitGrant {
    /// Grant backed by the given validator
    #[must_use]
    pub fn new(validator: Arc<dyn RequestValidator>) -> Self {
        Self { validator }
    }

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
        if response_type != "token" {
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

impl GrantType for ImplicitGrant {
    fn name(&self) -> &'static str {
        "token"
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
        tokens: &BearerTokenHandler,
    ) -> Result<ResponseParts> {
        let mut ctx = ValidationContext::new();
        // Fatal phase: a failure here must never become a redirect.
        resolve_client_and_redirect(&*self.validator, request, &mut ctx)?;
        let redirect_uri = ctx.redirect_uri.clone().unwrap_or_default();

        match self.validate_post_redirect(request, &mut ctx) {
            Ok(()) => {
                // No refresh token in the fragment, ever (RFC 6749 §4.2.2).
                let token = tokens.create_token(request, &ctx, false);
                let mut params: Vec<(String, String)> = token
                    .iter()
                    .map(|(k, v)| {
                        let value = match v {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (k.clone(), value)
                    })
                    .collect();
                if let Some(state) = &ctx.state {
                    if !token.contains_key("state") {
                        params.push(("state".to_string(), state.clone()));
                    }
                }
                let client_id = ctx.client_id.clone().unwrap_or_default();
                info!(client = %client_id, "issued implicit token");
                let location = add_params_to_uri(&redirect_uri, &params, true)?;
                Ok(ResponseParts::redirect(location))
            }
            Err(e) => {
                debug!(error = %e, "implicit request rejected, redirecting error");
                let location = add_params_to_uri(&redirect_uri, &e.query_pairs(), true)?;
                Ok(ResponseParts::redirect(location))
            }
        }
    }
}
