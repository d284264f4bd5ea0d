//! The OAuth2 authorization endpoint: dispatches on `response_type`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::http::{Request, ResponseParts};

use crate::oauth2::context::ValidationContext;
use crate::oauth2::grants::GrantType;
use crate::oauth2::tokens::BearerTokenHandler;

use super::guard::EndpointGuard;

/// Routes authorization requests to the grant registered for their
/// `response_type`; unrecognized values fall through to the default
/// handler, which reports them as unsupported.
pub struct AuthorizationEndpoint {
    grants: HashMap<String, Arc<dyn GrantType>>,
    default_grant: Arc<dyn GrantType>,
    tokens: BearerTokenHandler,
    guard: EndpointGuard,
}

impl AuthorizationEndpoint {
    /// Endpoint with `default_grant` answering unrecognized response types
    #[must_use]
    pub fn new(default_grant: Arc<dyn GrantType>, tokens: BearerTokenHandler) -> Self {
        Self {
            grants: HashMap::new(),
            default_grant,
            tokens,
            guard: EndpointGuard::new(),
        }
    }

    /// Register a grant under its wire `response_type`
    #[must_use]
    pub fn with_grant(mut self, grant: Arc<dyn GrantType>) -> Self {
        self.grants.insert(grant.name().to_string(), grant);
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

    fn grant_for(&self, request: &Request) -> &Arc<dyn GrantType> {
        let response_type = request.param("response_type").unwrap_or_default();
        self.grants
            .get(&response_type)
            .unwrap_or(&self.default_grant)
    }

    /// Run pre-flight validation only, for rendering a consent page
    pub fn validate_authorization_request(&self, request: &Request) -> Result<ValidationContext> {
        self.grant_for(request).validate_authorization_request(request)
    }

    /// Produce the redirect (or fatal error) for an authorization request
    pub fn create_authorization_response(&self, request: &Request) -> Result<ResponseParts> {
        let grant = self.grant_for(request);
        debug!(response_type = ?request.param("response_type"), grant = grant.name(), "dispatching authorization request");
        self.guard
            .run(|| grant.create_authorization_response(request, &self.tokens))
    }
}
