//! OAuth 2.0 (RFC 6749): grant type state machines, token handlers, and
//! server endpoints.
//!
//! The layering mirrors the protocol: [`grants`] implement the per-flow
//! state machines, [`tokens`] turn a validated request into a wire token,
//! and [`endpoints`] dispatch incoming requests to grants by their wire
//! name. All storage and policy lives behind
//! [`request_validator::RequestValidator`]; the [`context::ValidationContext`]
//! carries what validation established between stages.

pub mod context;
pub mod endpoints;
pub mod errors;
pub mod grants;
pub mod request_validator;
pub mod tokens;

pub use context::ValidationContext;
pub use endpoints::{
    AuthorizationEndpoint, EndpointGuard, ResourceEndpoint, RevocationEndpoint, TokenEndpoint,
};
pub use errors::{ErrorKind, OAuth2Error, ScopeChanged};
pub use grants::{
    AuthorizationCodeGrant, ClientCredentialsGrant, GrantType, ImplicitGrant, PasswordGrant,
    RefreshTokenGrant,
};
pub use request_validator::{AuthorizationCode, RequestValidator, TokenPayload};
pub use tokens::{BearerTokenHandler, MacAlgorithm, MacCredentials, MacDraft, MacTokenHandler};
