//! Protected resource access (RFC 5849 §3).

use std::sync::Arc;

use tracing::debug;

use crate::http::Request;

use super::{BaseEndpoint, TokenKind};
use crate::oauth1::signature::SignatureMethodRegistry;
use crate::oauth1::validator::RequestValidator;

/// Facts established while validating a protected-resource request.
///
/// Populated best-effort: on an invalid request the fields that were
/// established before the failure remain available for logging.
#[derive(Debug, Clone, Default)]
pub struct ResourceContext {
    /// Authenticated client key
    pub client_key: Option<String>,
    /// Access token that signed the request
    pub token: Option<String>,
    /// Realms the request asked to operate in
    pub realms: Vec<String>,
}

/// Validates signed requests against access tokens
pub struct ResourceEndpoint {
    base: BaseEndpoint,
}

impl ResourceEndpoint {
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

    /// Check whether a request may access a resource protected by `realms`.
    ///
    /// Returns the validity verdict plus whatever context was established;
    /// malformed requests yield `false` rather than an error; the resource
    /// host decides how to respond.
    #[must_use]
    pub fn validate_protected_resource_request(
        &self,
        request: &Request,
        realms: &[String],
    ) -> (bool, ResourceContext) {
        let mut ctx = ResourceContext {
            realms: realms.to_vec(),
            ..ResourceContext::default()
        };

        if self.base.check_transport(request).is_err() {
            return (false, ctx);
        }
        let params = match self.base.extract_parameters(request) {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "malformed protected resource request");
                return (false, ctx);
            }
        };
        if self.base.check_signature_method(&params).is_err()
            || self.base.check_client_key_shape(&params).is_err()
        {
            return (false, ctx);
        }

        let Some(token) = params.token.clone() else {
            return (false, ctx);
        };
        ctx.client_key = Some(params.consumer_key.clone());
        ctx.token = Some(token.clone());

        let Ok(verification) =
            self.base
                .verify_signature(request, &params, TokenKind::Access(&token))
        else {
            return (false, ctx);
        };
        let realm_token = if verification.token_ok {
            token
        } else {
            self.base.validator.dummy_access_token()
        };
        let realms_ok =
            self.base
                .validator
                .validate_realms(&params.consumer_key, &realm_token, realms);

        (verification.all_ok() && realms_ok, ctx)
    }
}
