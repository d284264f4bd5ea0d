//! OAuth 1.0a (RFC 5849): canonicalization, signing, and server-side
//! validation.
//!
//! The pipeline is strictly layered: [`parameters`] collects and normalizes,
//! [`base_string`] canonicalizes, [`signature`] signs, [`client`] composes
//! the three for outgoing requests, and [`endpoints`] runs them in reverse
//! against incoming ones, delegating every persistence and policy decision
//! to a [`validator::RequestValidator`].

pub mod base_string;
pub mod client;
pub mod encode;
pub mod endpoints;
pub mod errors;
pub mod parameters;
pub mod signature;
pub mod validator;

pub use client::{Client, SignaturePlacement};
pub use endpoints::{
    AccessTokenEndpoint, AuthorizationEndpoint, RequestTokenEndpoint, ResourceContext,
    ResourceEndpoint,
};
pub use errors::OAuth1Error;
pub use signature::{SignatureMethodRegistry, SigningCredentials};
pub use validator::{RequestValidator, TokenCredentials};
