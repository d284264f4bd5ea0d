//! Three-legged OAuth 1.0a server flow tests
//!
//! Runs a signing client against the request token, authorization, access
//! token, and resource endpoints backed by an in-memory validator.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use oauthx::http::{Request, decode_form};
use oauthx::oauth1::endpoints::{
    AccessTokenEndpoint, AuthorizationEndpoint, RequestTokenEndpoint, ResourceEndpoint,
};
use oauthx::oauth1::{Client, RequestValidator, TokenCredentials};

const CLIENT_KEY: &str = "dpf43f3p2l4k3l03";
const CLIENT_SECRET: &str = "kd94hf93k423kf44";
const CALLBACK: &str = "https://client.example.net/ready";

#[derive(Default)]
struct ServerState {
    request_tokens: HashMap<String, TokenCredentials>,
    access_tokens: HashMap<String, TokenCredentials>,
    callbacks: HashMap<String, String>,
    verifiers: HashMap<String, String>,
    seen_nonces: HashSet<(String, u64)>,
}

struct InMemoryValidator {
    state: Mutex<ServerState>,
}

impl InMemoryValidator {
    fn new() -> Self {
        Self {
            state: Mutex::new(ServerState::default()),
        }
    }
}

impl RequestValidator for InMemoryValidator {
    fn validate_client_key(&self, client_key: &str) -> bool {
        client_key == CLIENT_KEY
    }

    fn get_client_secret(&self, client_key: &str) -> Option<String> {
        (client_key == CLIENT_KEY).then(|| CLIENT_SECRET.to_string())
    }

    fn validate_request_token(&self, _client_key: &str, token: &str) -> bool {
        self.state.lock().unwrap().request_tokens.contains_key(token)
    }

    fn validate_access_token(&self, _client_key: &str, token: &str) -> bool {
        self.state.lock().unwrap().access_tokens.contains_key(token)
    }

    fn get_request_token_secret(&self, _client_key: &str, token: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .request_tokens
            .get(token)
            .map(|t| t.secret.clone())
    }

    fn get_access_token_secret(&self, _client_key: &str, token: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .access_tokens
            .get(token)
            .map(|t| t.secret.clone())
    }

    fn validate_timestamp_and_nonce(
        &self,
        client_key: &str,
        timestamp: u64,
        nonce: &str,
        _token: Option<&str>,
    ) -> bool {
        let key = (format!("{client_key}:{nonce}"), timestamp);
        self.state.lock().unwrap().seen_nonces.insert(key)
    }

    fn validate_redirect_uri(&self, _client_key: &str, redirect_uri: &str) -> bool {
        redirect_uri == CALLBACK
    }

    fn validate_verifier(&self, _client_key: &str, token: &str, verifier: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .verifiers
            .get(token)
            .is_some_and(|v| v == verifier)
    }

    fn verify_request_token(&self, token: &str) -> bool {
        self.state.lock().unwrap().request_tokens.contains_key(token)
    }

    fn get_redirect_uri(&self, token: &str) -> Option<String> {
        self.state.lock().unwrap().callbacks.get(token).cloned()
    }

    fn save_request_token(&self, _client_key: &str, token: &TokenCredentials, callback: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .request_tokens
            .insert(token.key.clone(), token.clone());
        state.callbacks.insert(token.key.clone(), callback.to_string());
    }

    fn save_access_token(&self, _client_key: &str, token: &TokenCredentials) {
        self.state
            .lock()
            .unwrap()
            .access_tokens
            .insert(token.key.clone(), token.clone());
    }

    fn save_verifier(&self, token: &str, verifier: &str) {
        self.state
            .lock()
            .unwrap()
            .verifiers
            .insert(token.to_string(), verifier.to_string());
    }
}

fn body_param(body: &str, name: &str) -> Option<String> {
    decode_form(body)
        .into_iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v)
}

/// Test the complete three-legged flow, signing every leg for real
#[test]
fn test_three_legged_flow() {
    let validator = Arc::new(InMemoryValidator::new());
    let request_token_ep = RequestTokenEndpoint::new(validator.clone());
    let authorization_ep = AuthorizationEndpoint::new(validator.clone());
    let access_token_ep = AccessTokenEndpoint::new(validator.clone());
    let resource_ep = ResourceEndpoint::new(validator.clone());

    // Leg 1: temporary credentials
    let signer = Client::new(CLIENT_KEY)
        .with_client_secret(CLIENT_SECRET)
        .with_callback(CALLBACK);
    let request = signer
        .sign(&Request::new("POST", "https://server.example.com/initiate"))
        .unwrap();
    let resp = request_token_ep.create_request_token_response(&request);
    assert_eq!(resp.status, 200, "body: {:?}", resp.body);
    let body = resp.body.unwrap();
    let temp_token = body_param(&body, "oauth_token").unwrap();
    let temp_secret = body_param(&body, "oauth_token_secret").unwrap();
    assert_eq!(
        body_param(&body, "oauth_callback_confirmed").as_deref(),
        Some("true")
    );

    // Leg 2: resource owner authorizes, server redirects with a verifier
    let authorize = Request::new(
        "GET",
        format!("https://server.example.com/authorize?oauth_token={temp_token}"),
    );
    let resp = authorization_ep.create_authorization_response(&authorize);
    assert_eq!(resp.status, 302);
    let location = resp.header("Location").unwrap();
    assert!(location.starts_with(CALLBACK));
    let query = location.split_once('?').unwrap().1;
    let verifier = body_param(query, "oauth_verifier").unwrap();

    // Leg 3: exchange for access credentials
    let signer = Client::new(CLIENT_KEY)
        .with_client_secret(CLIENT_SECRET)
        .with_resource_owner(temp_token.clone(), temp_secret)
        .with_verifier(verifier);
    let request = signer
        .sign(&Request::new("POST", "https://server.example.com/token"))
        .unwrap();
    let resp = access_token_ep.create_access_token_response(&request);
    assert_eq!(resp.status, 200, "body: {:?}", resp.body);
    let body = resp.body.unwrap();
    let access_token = body_param(&body, "oauth_token").unwrap();
    let access_secret = body_param(&body, "oauth_token_secret").unwrap();
    assert_ne!(access_token, temp_token);

    // Protected resource access with the new credentials
    let signer = Client::new(CLIENT_KEY)
        .with_client_secret(CLIENT_SECRET)
        .with_resource_owner(access_token.clone(), access_secret);
    let request = signer
        .sign(&Request::new("GET", "https://server.example.com/photos"))
        .unwrap();
    let (valid, ctx) = resource_ep.validate_protected_resource_request(&request, &[]);
    assert!(valid);
    assert_eq!(ctx.client_key.as_deref(), Some(CLIENT_KEY));
    assert_eq!(ctx.token.as_deref(), Some(access_token.as_str()));
}

/// Test that a wrong client secret fails verification without leaking which
/// check failed
#[test]
fn test_bad_secret_is_rejected() {
    let validator = Arc::new(InMemoryValidator::new());
    let endpoint = RequestTokenEndpoint::new(validator);

    let signer = Client::new(CLIENT_KEY)
        .with_client_secret("wrong-secret")
        .with_callback(CALLBACK);
    let request = signer
        .sign(&Request::new("POST", "https://server.example.com/initiate"))
        .unwrap();
    let resp = endpoint.create_request_token_response(&request);
    assert_eq!(resp.status, 401);
}

/// Test nonce replay rejection
#[test]
fn test_nonce_replay_is_rejected() {
    let validator = Arc::new(InMemoryValidator::new());
    let endpoint = RequestTokenEndpoint::new(validator);

    let signer = Client::new(CLIENT_KEY)
        .with_client_secret(CLIENT_SECRET)
        .with_callback(CALLBACK)
        .with_fixed_timestamp_nonce(oauthx::generate::unix_timestamp(), "replayed-nonce");
    let request = signer
        .sign(&Request::new("POST", "https://server.example.com/initiate"))
        .unwrap();

    let first = endpoint.create_request_token_response(&request);
    assert_eq!(first.status, 200);
    let second = endpoint.create_request_token_response(&request);
    assert_eq!(second.status, 401);
}

/// Test plain HTTP is refused while SSL enforcement is on
#[test]
fn test_http_transport_is_refused() {
    let validator = Arc::new(InMemoryValidator::new());
    let endpoint = RequestTokenEndpoint::new(validator);

    let signer = Client::new(CLIENT_KEY)
        .with_client_secret(CLIENT_SECRET)
        .with_callback(CALLBACK);
    let request = signer
        .sign(&Request::new("POST", "http://server.example.com/initiate"))
        .unwrap();
    let resp = endpoint.create_request_token_response(&request);
    assert_eq!(resp.status, 400);
}

/// Test a timestamp that is not a 10-digit seconds value is malformed
#[test]
fn test_malformed_timestamp_is_rejected() {
    let validator = Arc::new(InMemoryValidator::new());
    let endpoint = RequestTokenEndpoint::new(validator);

    let signer = Client::new(CLIENT_KEY)
        .with_client_secret(CLIENT_SECRET)
        .with_callback(CALLBACK)
        .with_fixed_timestamp_nonce(123, "short-ts-nonce");
    let request = signer
        .sign(&Request::new("POST", "https://server.example.com/initiate"))
        .unwrap();
    let resp = endpoint.create_request_token_response(&request);
    assert_eq!(resp.status, 400);
    assert!(resp.body.unwrap().contains("invalid_request"));
}

/// Test a timestamp far in the future falls outside the window too
#[test]
fn test_future_timestamp_is_rejected() {
    let validator = Arc::new(InMemoryValidator::new());
    let endpoint = RequestTokenEndpoint::new(validator);

    let signer = Client::new(CLIENT_KEY)
        .with_client_secret(CLIENT_SECRET)
        .with_callback(CALLBACK)
        .with_fixed_timestamp_nonce(
            oauthx::generate::unix_timestamp() + 7200,
            "future-ts-nonce",
        );
    let request = signer
        .sign(&Request::new("POST", "https://server.example.com/initiate"))
        .unwrap();
    let resp = endpoint.create_request_token_response(&request);
    assert_eq!(resp.status, 400);
    assert!(resp.body.unwrap().contains("invalid_request"));
}

/// Test a declared oauth_version other than 1.0 is refused
#[test]
fn test_wrong_oauth_version_is_rejected() {
    let validator = Arc::new(InMemoryValidator::new());
    let endpoint = RequestTokenEndpoint::new(validator);

    let now = oauthx::generate::unix_timestamp();
    let request = Request::new(
        "POST",
        format!(
            "https://server.example.com/initiate?oauth_consumer_key={CLIENT_KEY}\
             &oauth_signature_method=HMAC-SHA1&oauth_timestamp={now}\
             &oauth_nonce=v2nonce&oauth_signature=sig&oauth_version=2.0\
             &oauth_callback=https%3A%2F%2Fclient.example.net%2Fready"
        ),
    );
    let resp = endpoint.create_request_token_response(&request);
    assert_eq!(resp.status, 400);
    assert!(resp.body.unwrap().contains("invalid_request"));
}

/// Test an unknown client fails as an authentication error, after the full
/// verification pass has run against the substituted credentials
#[test]
fn test_unknown_client_fails_authentication_not_shape() {
    let validator = Arc::new(InMemoryValidator::new());
    let endpoint = RequestTokenEndpoint::new(validator);

    let signer = Client::new("zzzz9999zzzz9999")
        .with_client_secret("some-secret")
        .with_callback(CALLBACK);
    let request = signer
        .sign(&Request::new("POST", "https://server.example.com/initiate"))
        .unwrap();
    let resp = endpoint.create_request_token_response(&request);
    // 401, not 400: a well-formed request from an unknown client is an
    // authentication failure, indistinguishable from a bad signature
    assert_eq!(resp.status, 401);
}

/// Test an unknown request token never reaches verifier issuance
#[test]
fn test_authorization_of_unknown_token_fails() {
    let validator = Arc::new(InMemoryValidator::new());
    let endpoint = AuthorizationEndpoint::new(validator);
    let request = Request::new(
        "GET",
        "https://server.example.com/authorize?oauth_token=nosuchtoken",
    );
    let resp = endpoint.create_authorization_response(&request);
    assert_eq!(resp.status, 401);
}
