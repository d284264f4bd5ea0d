//! Access token representations: Bearer (RFC 6750) and MAC (draft).

pub mod bearer;
pub mod mac;

pub use bearer::{BearerTokenHandler, token_json};
pub use mac::{MacAlgorithm, MacCredentials, MacDraft, MacTokenHandler};
