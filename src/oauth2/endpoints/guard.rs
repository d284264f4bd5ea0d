//! Availability and error containment shared by all OAuth2 endpoints.

use tracing::{error, warn};

use crate::error::{Error, Result};
use crate::http::ResponseParts;

use crate::oauth2::errors::{ErrorKind, OAuth2Error};

/// Wraps every endpoint entry point.
///
/// An unavailable endpoint answers `503 temporarily_unavailable` without
/// running any grant logic. With `catch_errors` set, every escaping
/// failure, configuration errors and fatal protocol errors alike, becomes
/// a generic `500 server_error` instead of propagating; without it both
/// propagate for the caller to render out of band.
#[derive(Debug, Clone)]
pub struct EndpointGuard {
    available: bool,
    catch_errors: bool,
}

impl Default for EndpointGuard {
    fn default() -> Self {
        Self {
            available: true,
            catch_errors: false,
        }
    }
}

impl EndpointGuard {
    /// A guard that is available and propagates non-protocol errors
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert non-protocol failures into `500 server_error` responses
    #[must_use]
    pub fn with_catch_errors(mut self) -> Self {
        self.catch_errors = true;
        self
    }

    /// Mark the endpoint as temporarily out of service
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Whether requests are currently admitted
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Run an endpoint body under this guard's policy
    pub fn run<F>(&self, f: F) -> Result<ResponseParts>
    where
        F: FnOnce() -> Result<ResponseParts>,
    {
        if !self.available {
            warn!("endpoint unavailable, refusing request");
            return Ok(OAuth2Error::new(ErrorKind::TemporarilyUnavailable)
                .with_description("service temporarily unavailable")
                .to_json_response());
        }
        match f() {
            Ok(response) => Ok(response),
            Err(e) if self.catch_errors => {
                error!(error = %e, "endpoint failure contained");
                Ok(OAuth2Error::new(ErrorKind::ServerError).to_json_response())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_guard_answers_503_without_running_the_body() {
        let mut guard = EndpointGuard::new();
        guard.set_available(false);
        let resp = guard
            .run(|| panic!("body must not run"))
            .unwrap();
        assert_eq!(resp.status, 503);
        assert!(resp.body.unwrap().contains("temporarily_unavailable"));
    }

    #[test]
    fn catch_errors_contains_configuration_failures() {
        let guard = EndpointGuard::new().with_catch_errors();
        let resp = guard
            .run(|| Err(Error::CapabilityNotImplemented("validate_user")))
            .unwrap();
        assert_eq!(resp.status, 500);
        assert!(resp.body.unwrap().contains("server_error"));
    }

    #[test]
    fn configuration_failures_propagate_without_catch_errors() {
        let guard = EndpointGuard::new();
        let result = guard.run(|| Err(Error::CapabilityNotImplemented("validate_user")));
        assert!(matches!(result, Err(Error::CapabilityNotImplemented(_))));
    }

    #[test]
    fn fatal_protocol_errors_become_500_under_catch_errors() {
        let guard = EndpointGuard::new().with_catch_errors();
        let resp = guard
            .run(|| Err(Error::OAuth2(OAuth2Error::new(ErrorKind::MissingClientId))))
            .unwrap();
        assert_eq!(resp.status, 500);
    }

    #[test]
    fn fatal_protocol_errors_propagate_without_catch_errors() {
        let guard = EndpointGuard::new();
        let result =
            guard.run(|| Err(Error::OAuth2(OAuth2Error::new(ErrorKind::MissingClientId))));
        assert!(matches!(result, Err(Error::OAuth2(_))));
    }
}
