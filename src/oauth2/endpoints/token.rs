//! The OAuth2 token endpoint: dispatches on `grant_type`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::http::{Request, ResponseParts};

use crate::oauth2::errors::{ErrorKind, OAuth2Error};
use crate::oauth2::grants::GrantType;
use crate::oauth2::tokens::BearerTokenHandler;

use super::guard::EndpointGuard;

/// Routes token requests to the grant registered for their `grant_type`.
///
/// Unlike the authorization endpoint there is no implicit fallback: an
/// unregistered `grant_type` gets `400 unsupported_grant_type` unless a
/// default handler was installed.
pub struct TokenEndpoint {
    grants: HashMap<String, Arc<dyn GrantType>>,
    default_grant: Option<Arc<dyn GrantType>>,
    tokens: BearerTokenHandler,
    guard: EndpointGuard,
}

impl TokenEndpoint {
    /// Empty endpoint; register grants with [`Self::with_grant`]
    #[must_use]
    pub fn new(tokens: BearerTokenHandler) -> Self {
        Self {
            grants: HashMap::new(),
            default_grant: None,
            tokens,
            guard: EndpointGuard::new(),
        }
    }

    /// Register a grant under its wire `grant_type`
    #[must_use]
    pub fn with_grant(mut self, grant: Arc<dyn GrantType>) -> Self {
        self.grants.insert(grant.name().to_string(), grant);
        self
    }

    /// Install a fallback for unregistered grant types
    #[must_use]
    pub fn with_default_grant(mut self, grant: Arc<dyn GrantType>) -> Self {
        self.default_grant = Some(grant);
        self
    }

    /// Replace the guard policy
    #[must_use]
    pub fn with_guard(mut self, guard: EndpointGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Mutable guard access, for flipping availability at runtime
    pub fn guard_mut(&mut self) -> &mut EndpointGuard {
        &mut self.guard
    }

    /// Produce the JSON token (or error) response for a token request
    pub fn create_token_response(&self, request: &Request) -> Result<ResponseParts> {
        self.guard.run(|| {
            let grant_type = request.param("grant_type").unwrap_or_default();
            let grant = match self.grants.get(&grant_type).or(self.default_grant.as_ref()) {
                Some(grant) => grant,
                None => {
                    return Ok(OAuth2Error::new(ErrorKind::UnsupportedGrantType)
                        .with_description(format!("no handler for grant_type {grant_type:?}"))
                        .to_json_response());
                }
            };
            debug!(grant_type = %grant_type, grant = grant.name(), "dispatching token request");
            grant.create_token_response(request, &self.tokens)
        })
    }
}
