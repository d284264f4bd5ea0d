//! OAuth2 server endpoints: authorization, token, resource, revocation,
//! all wrapped by the availability/error [`guard`].

pub mod authorization;
pub mod guard;
pub mod resource;
pub mod revocation;
pub mod token;

pub use authorization::AuthorizationEndpoint;
pub use guard::EndpointGuard;
pub use resource::ResourceEndpoint;
pub use revocation::RevocationEndpoint;
pub use token::TokenEndpoint;
