//! Transport-free HTTP request/response model.
//!
//! The engine never performs I/O. Callers build a [`Request`] from whatever
//! transport they use, hand it to a client or endpoint, and receive
//! [`ResponseParts`] back to write out themselves.

use std::borrow::Cow;

use url::form_urlencoded;

/// Content type required for a body to participate in OAuth1 signing and
/// OAuth2 token/revocation requests.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Request body representation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    /// No body
    #[default]
    Empty,
    /// Decoded `application/x-www-form-urlencoded` key/value pairs
    Form(Vec<(String, String)>),
    /// Opaque bytes; never inspected for parameters
    Raw(Vec<u8>),
}

impl Body {
    /// True for [`Body::Empty`]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// An HTTP request as seen by the signing and validation pipelines.
///
/// Owned by a single call; populated once by the caller and read by the
/// engine. Validator-discovered facts go into the per-protocol context
/// structs, not onto the request itself.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method, e.g. `GET`
    pub method: String,
    /// Absolute request URI, query string included
    pub uri: String,
    /// Header name/value pairs; names matched case-insensitively
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Body,
}

impl Request {
    /// Create a request with no headers and an empty body
    #[must_use]
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a decoded form body and the matching content type
    #[must_use]
    pub fn with_form_body(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Body::Form(pairs);
        self.headers
            .push(("Content-Type".to_string(), FORM_URLENCODED.to_string()));
        self
    }

    /// Set an opaque body
    #[must_use]
    pub fn with_raw_body(mut self, bytes: Vec<u8>) -> Self {
        self.body = Body::Raw(bytes);
        self
    }

    /// Case-insensitive header lookup; first match wins
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The raw query string, if any
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, q)| q)
    }

    /// Decoded query parameters in wire order
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match self.query_string() {
            Some(q) => decode_form(q),
            None => Vec::new(),
        }
    }

    /// Decoded form body pairs, when the body is a form
    #[must_use]
    pub fn body_pairs(&self) -> Option<&[(String, String)]> {
        match &self.body {
            Body::Form(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// First value for a parameter found in the query string or form body
    #[must_use]
    pub fn param(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .or_else(|| {
                self.body_pairs()?
                    .iter()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.clone())
            })
    }

    /// The body as wire bytes: forms re-encoded, raw bodies as-is
    #[must_use]
    pub fn body_bytes(&self) -> Vec<u8> {
        match &self.body {
            Body::Empty => Vec::new(),
            Body::Form(pairs) => encode_form(
                pairs
                    .iter()
                    .map(|(k, v)| (Cow::from(k.as_str()), Cow::from(v.as_str()))),
            )
            .into_bytes(),
            Body::Raw(bytes) => bytes.clone(),
        }
    }

    /// Whether the request declares a form-encoded content type
    #[must_use]
    pub fn is_form_encoded(&self) -> bool {
        self.header("Content-Type")
            .is_some_and(|ct| ct.split(';').next().unwrap_or("").trim() == FORM_URLENCODED)
    }

    /// Parameter names appearing more than once across query and body.
    ///
    /// Duplicates are preserved by the collectors on purpose; protocol rules
    /// decide whether they are an error.
    #[must_use]
    pub fn duplicate_params(&self) -> Vec<String> {
        let mut seen: Vec<&str> = Vec::new();
        let mut dups: Vec<String> = Vec::new();
        let query = self.query_pairs();
        let body = self.body_pairs().unwrap_or(&[]);
        for (k, _) in query.iter().chain(body.iter()) {
            if seen.contains(&k.as_str()) {
                if !dups.contains(k) {
                    dups.push(k.clone());
                }
            } else {
                seen.push(k.as_str());
            }
        }
        dups
    }
}

/// Decode an `application/x-www-form-urlencoded` string into pairs
#[must_use]
pub fn decode_form(encoded: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(encoded.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Encode pairs into an `application/x-www-form-urlencoded` string
#[must_use]
pub fn encode_form<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (Cow<'a, str>, Cow<'a, str>)>,
{
    let mut ser = form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        ser.append_pair(&k, &v);
    }
    ser.finish()
}

/// A server response in transport-neutral form
#[derive(Debug, Clone)]
pub struct ResponseParts {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Response body, if any
    pub body: Option<String>,
}

impl ResponseParts {
    /// An empty response with the given status
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A JSON response with cache-defeating headers, as token endpoints
    /// require (RFC 6749 §5.1)
    #[must_use]
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Cache-Control".to_string(), "no-store".to_string()),
                ("Pragma".to_string(), "no-cache".to_string()),
            ],
            body: Some(body),
        }
    }

    /// A form-encoded response body
    #[must_use]
    pub fn form(status: u16, body: String) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), FORM_URLENCODED.to_string())],
            body: Some(body),
        }
    }

    /// A 302 redirect
    #[must_use]
    pub fn redirect(location: String) -> Self {
        Self {
            status: 302,
            headers: vec![("Location".to_string(), location)],
            body: None,
        }
    }

    /// First value of a response header, matched case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
