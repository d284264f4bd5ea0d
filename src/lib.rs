//! Transport-free OAuth 1.0a and OAuth 2.0 protocol engine.
//!
//! # Features
//!
//! - **OAuth 1.0a (RFC 5849)**: percent-encoding, parameter collection and
//!   normalization, signature base strings, HMAC-SHA1 / RSA-SHA1 /
//!   PLAINTEXT signing, a request-signing client, and the four server
//!   endpoints (request token, authorization, access token, resource)
//! - **OAuth 2.0 (RFC 6749)**: the five core grant types, Bearer and MAC
//!   token handlers, and authorization / token / resource / revocation
//!   endpoints with availability and error containment
//! - **No I/O**: callers map their transport's requests into [`http::Request`]
//!   and write [`http::ResponseParts`] back out; the engine never opens a
//!   socket
//! - **Pluggable policy**: every storage lookup and accept/reject decision
//!   goes through a per-protocol `RequestValidator` trait

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod generate;
pub mod http;
pub mod oauth1;
pub mod oauth2;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
