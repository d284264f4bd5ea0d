//! RFC 6749 grant type state machines.
//!
//! Each grant implements [`GrantType`]; the endpoints dispatch to them by
//! wire name. The contract for error handling is uniform: protocol errors
//! that may safely travel to the client come back as `Ok` responses (JSON
//! bodies or error redirects), while *fatal* errors (bad client identity
//! or an untrustworthy redirect URI) and configuration failures come back
//! as `Err` for the caller to surface.

use std::borrow::Cow;
use std::sync::Arc;

use url::Url;

use crate::error::{Error, Result};
use crate::http::{Request, ResponseParts, encode_form};

use super::context::{ValidationContext, parse_scope};
use super::errors::{ErrorKind, OAuth2Error};
use super::request_validator::RequestValidator;
use super::tokens::BearerTokenHandler;

pub mod authorization_code;
pub mod client_credentials;
pub mod implicit;
pub mod password;
pub mod refresh_token;

pub use authorization_code::AuthorizationCodeGrant;
pub use client_credentials::ClientCredentialsGrant;
pub use implicit::ImplicitGrant;
pub use password::PasswordGrant;
pub use refresh_token::RefreshTokenGrant;

/// One grant type's view of the two endpoint legs.
///
/// Grants that serve only one endpoint leave the other method at its
/// default, which reports the request as unsupported.
pub trait GrantType: Send + Sync {
    /// The wire name dispatched on (`response_type` or `grant_type` value)
    fn name(&self) -> &'static str;

    /// Validate an authorization request without issuing anything, for
    /// rendering consent pages before the resource owner decides
    fn validate_authorization_request(&self, request: &Request) -> Result<ValidationContext> {
        let _ = request;
        Err(Error::OAuth2(OAuth2Error::new(
            ErrorKind::UnsupportedResponseType,
        )))
    }

    /// Validate a token request without issuing, persisting, or
    /// invalidating anything, for callers that run their own policy step
    /// between validation and issuance
    fn validate_token_request(&self, request: &Request) -> Result<ValidationContext> {
        let _ = request;
        Err(Error::OAuth2(OAuth2Error::new(
            ErrorKind::UnsupportedGrantType,
        )))
    }

    /// Authorization endpoint leg
    fn create_authorization_response(
        &self,
        request: &Request,
        tokens: &BearerTokenHandler,
    ) -> Result<ResponseParts> {
        let _ = (request, tokens);
        Err(Error::OAuth2(OAuth2Error::new(
            ErrorKind::UnsupportedResponseType,
        )))
    }

    /// Token endpoint leg
    fn create_token_response(
        &self,
        request: &Request,
        tokens: &BearerTokenHandler,
    ) -> Result<ResponseParts> {
        let _ = (request, tokens);
        Err(Error::OAuth2(OAuth2Error::new(
            ErrorKind::UnsupportedGrantType,
        )))
    }
}

/// Append parameters to a URI's query or fragment component
pub(crate) fn add_params_to_uri(
    uri: &str,
    params: &[(String, String)],
    fragment: bool,
) -> Result<String> {
    let mut url = Url::parse(uri).map_err(|e| {
        Error::OAuth2(
            OAuth2Error::new(ErrorKind::InvalidRedirectUri)
                .with_description(format!("unparseable redirect URI: {e}")),
        )
    })?;
    if fragment {
        let encoded = encode_form(
            params
                .iter()
                .map(|(k, v)| (Cow::from(k.as_str()), Cow::from(v.as_str()))),
        );
        url.set_fragment(Some(&encoded));
    } else {
        for (k, v) in params {
            url.query_pairs_mut().append_pair(k, v);
        }
    }
    Ok(url.to_string())
}

/// The fatal phase of authorization request validation.
///
/// Establishes a trustworthy client identity and redirect URI, or fails
/// with a fatal error that the caller must surface directly. On success
/// `ctx.client_id`, `ctx.redirect_uri`, and `ctx.state` are populated.
pub(crate) fn resolve_client_and_redirect(
    validator: &dyn RequestValidator,
    request: &Request,
    ctx: &mut ValidationContext,
) -> Result<()> {
    let client_id = request
        .param("client_id")
        .ok_or(Error::OAuth2(OAuth2Error::new(ErrorKind::MissingClientId)))?;
    if !validator.validate_client_id(&client_id, request) {
        return Err(Error::OAuth2(
            OAuth2Error::new(ErrorKind::InvalidClientId)
                .with_description(format!("unknown client {client_id}")),
        ));
    }
    ctx.client_id = Some(client_id.clone());

    let redirect_uri = match request.param("redirect_uri") {
        Some(uri) => {
            let parsed = Url::parse(&uri).map_err(|_| {
                Error::OAuth2(
                    OAuth2Error::new(ErrorKind::InvalidRedirectUri)
                        .with_description("redirect URI must be absolute"),
                )
            })?;
            if parsed.cannot_be_a_base() {
                return Err(Error::OAuth2(
                    OAuth2Error::new(ErrorKind::InvalidRedirectUri)
                        .with_description("redirect URI must be absolute"),
                ));
            }
            if !validator.validate_redirect_uri(&client_id, &uri) {
                return Err(Error::OAuth2(OAuth2Error::new(
                    ErrorKind::MismatchingRedirectUri,
                )));
            }
            uri
        }
        None => validator
            .get_default_redirect_uri(&client_id)
            .ok_or(Error::OAuth2(OAuth2Error::new(
                ErrorKind::MissingRedirectUri,
            )))?,
    };
    ctx.redirect_uri = Some(redirect_uri);
    ctx.state = request.param("state");
    Ok(())
}

/// Resolve the request's scopes against the validator.
///
/// An absent scope parameter pulls in the client's defaults; a present one
/// must pass `validate_scopes`.
pub(crate) fn resolve_scopes(
    validator: &dyn RequestValidator,
    request: &Request,
    ctx: &mut ValidationContext,
) -> std::result::Result<(), OAuth2Error> {
    let client_id = ctx.client_id.clone().unwrap_or_default();
    match request.param("scope") {
        Some(raw) => {
            let scopes = parse_scope(&raw);
            if !validator.validate_scopes(&client_id, &scopes, request) {
                return Err(OAuth2Error::new(ErrorKind::InvalidScope)
                    .with_state(ctx.state.clone()));
            }
            ctx.requested_scopes = scopes.clone();
            ctx.scopes = scopes;
        }
        None => {
            ctx.scopes = validator.get_default_scopes(&client_id);
            ctx.default_scopes_used = true;
        }
    }
    Ok(())
}

/// Establish the client identity for a token request.
///
/// Confidential clients must authenticate; public clients are identified
/// by `client_id` through `authenticate_client_id`.
pub(crate) fn authenticate_token_client(
    validator: &Arc<dyn RequestValidator>,
    request: &Request,
    ctx: &mut ValidationContext,
) -> std::result::Result<(), OAuth2Error> {
    if validator.client_authentication_required(request) {
        if !validator.authenticate_client(request, ctx) {
            return Err(OAuth2Error::invalid_client("client authentication failed"));
        }
        ctx.client_authenticated = true;
    } else {
        let client_id = request
            .param("client_id")
            .ok_or_else(|| OAuth2Error::invalid_client("client_id required"))?;
        if !validator.authenticate_client_id(&client_id, request) {
            return Err(OAuth2Error::invalid_client("unknown public client"));
        }
        ctx.client_id = Some(client_id);
    }
    Ok(())
}

/// Reject requests with repeated parameters (RFC 6749 §3.1, §3.2)
pub(crate) fn reject_duplicates(
    request: &Request,
) -> std::result::Result<(), OAuth2Error> {
    let dups = request.duplicate_params();
    if dups.is_empty() {
        Ok(())
    } else {
        Err(OAuth2Error::invalid_request(format!(
            "duplicate parameters: {}",
            dups.join(", ")
        )))
    }
}
