//! Bearer token issuance and validation (RFC 6750).

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::generate::random_token;
use crate::http::Request;

use crate::oauth2::context::ValidationContext;
use crate::oauth2::request_validator::{RequestValidator, TokenPayload};

/// Bytes of entropy per issued token
const TOKEN_BYTES: usize = 30;

/// Creates and validates Bearer tokens, delegating every accept/reject and
/// persistence decision to the validator
pub struct BearerTokenHandler {
    validator: Arc<dyn RequestValidator>,
}

impl BearerTokenHandler {
    /// Create the handler
    #[must_use]
    pub fn new(validator: Arc<dyn RequestValidator>) -> Self {
        Self { validator }
    }

    /// Assemble a token body for the validated request in `ctx`.
    ///
    /// The granted scope is always present when any scopes were granted,
    /// in particular when it differs from what was requested, which RFC
    /// 6749 §3.3 requires the client to be told about. The token is handed
    /// to the validator for persistence before being returned.
    #[must_use]
    pub fn create_token(
        &self,
        request: &Request,
        ctx: &ValidationContext,
        include_refresh: bool,
    ) -> TokenPayload {
        let mut token = Map::new();
        token.insert("access_token".to_string(), json!(random_token(TOKEN_BYTES)));
        token.insert("token_type".to_string(), json!("Bearer"));
        token.insert(
            "expires_in".to_string(),
            json!(self.validator.token_expires_in()),
        );

        if let Some(change) = ctx.scope_change() {
            warn!(
                requested = ?change.requested,
                granted = ?change.granted,
                "granted scope differs from requested scope"
            );
        }
        if let Some(scope) = ctx.scope_string() {
            token.insert("scope".to_string(), json!(scope));
        }
        if let Some(state) = &ctx.state {
            token.insert("state".to_string(), json!(state));
        }

        if include_refresh {
            let refresh = match &ctx.refresh_token {
                Some(existing) if !self.validator.rotate_refresh_token(request) => {
                    existing.clone()
                }
                _ => random_token(TOKEN_BYTES),
            };
            token.insert("refresh_token".to_string(), json!(refresh));
        }

        if let Some(extra) = self.validator.get_extra_token_credentials(ctx) {
            for (key, value) in extra {
                token.entry(key).or_insert(value);
            }
        }

        self.validator.save_bearer_token(&token, ctx);
        debug!(client = ?ctx.client_id, "issued bearer token");
        token
    }

    /// Pull the bearer value off a request: `Authorization: Bearer …`
    /// first, then an `access_token` query or body parameter.
    #[must_use]
    pub fn extract_token(request: &Request) -> Option<String> {
        if let Some(header) = request.header("Authorization") {
            if let Some(token) = header.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
        request.param("access_token")
    }

    /// Whether the request carries a bearer token valid for the required
    /// scopes. The verdict belongs entirely to the validator.
    #[must_use]
    pub fn validate_request(
        &self,
        request: &Request,
        required_scopes: &[String],
        ctx: &mut ValidationContext,
    ) -> bool {
        match Self::extract_token(request) {
            Some(token) => self
                .validator
                .validate_bearer_token(&token, required_scopes, ctx),
            None => false,
        }
    }
}

/// Serialize a token payload to the JSON body of a token response
#[must_use]
pub fn token_json(token: &TokenPayload) -> String {
    Value::Object(token.clone()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_header_before_params() {
        let req = Request::new("GET", "https://rs.example/r?access_token=from_query")
            .with_header("Authorization", "Bearer from_header");
        assert_eq!(
            BearerTokenHandler::extract_token(&req).as_deref(),
            Some("from_header")
        );
    }

    #[test]
    fn falls_back_to_query_and_body() {
        let req = Request::new("GET", "https://rs.example/r?access_token=q1");
        assert_eq!(BearerTokenHandler::extract_token(&req).as_deref(), Some("q1"));

        let req = Request::new("POST", "https://rs.example/r")
            .with_form_body(vec![("access_token".to_string(), "b1".to_string())]);
        assert_eq!(BearerTokenHandler::extract_token(&req).as_deref(), Some("b1"));

        let req = Request::new("GET", "https://rs.example/r");
        assert_eq!(BearerTokenHandler::extract_token(&req), None);
    }

    #[test]
    fn non_bearer_scheme_is_not_extracted() {
        let req = Request::new("GET", "https://rs.example/r")
            .with_header("Authorization", "Basic dXNlcjpwYXNz");
        assert_eq!(BearerTokenHandler::extract_token(&req), None);
    }
}
