//! Crate-level error type folding both protocol families.

use thiserror::Error;

use crate::oauth1::errors::OAuth1Error;
use crate::oauth2::errors::OAuth2Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level errors
///
/// Protocol errors carry their own wire representation; the
/// [`Error::CapabilityNotImplemented`] variant is deliberately separate so
/// that a misconfigured validator (a programming bug) is never mistaken for
/// a protocol failure that could be encoded onto the wire.
#[derive(Error, Debug)]
pub enum Error {
    /// OAuth 1.0a protocol error
    #[error(transparent)]
    OAuth1(#[from] OAuth1Error),

    /// OAuth 2.0 protocol error
    #[error(transparent)]
    OAuth2(#[from] OAuth2Error),

    /// A validator capability required by the invoked flow has no
    /// implementation
    #[error("validator capability not implemented: {0}")]
    CapabilityNotImplemented(&'static str),
}

impl Error {
    /// Whether this error may be encoded into a redirect URI.
    ///
    /// Fatal OAuth2 errors and configuration bugs must never be redirected
    /// to an unverified client URI.
    #[must_use]
    pub fn is_redirectable(&self) -> bool {
        match self {
            Self::OAuth2(e) => !e.kind.is_fatal(),
            Self::OAuth1(_) | Self::CapabilityNotImplemented(_) => false,
        }
    }
}
