//! Signature base string construction (RFC 5849 §3.4.1).

use url::Url;

use super::encode::percent_encode;
use super::errors::OAuth1Error;

/// Normalize a request URI for the base string.
///
/// Lowercases scheme and host, strips default ports (80 for http, 443 for
/// https), drops query and fragment, and guarantees a non-empty path. An
/// explicit `host` override supports proxied deployments where the request
/// URI does not carry the public authority; a relative URI without an
/// override is rejected.
pub fn normalize_base_string_uri(
    uri: &str,
    host: Option<&str>,
) -> Result<String, OAuth1Error> {
    let parsed = Url::parse(uri)
        .map_err(|e| OAuth1Error::InvalidRequest(format!("invalid base string URI: {e}")))?;

    let scheme = parsed.scheme().to_ascii_lowercase();
    let authority = match host {
        Some(h) => h.to_ascii_lowercase(),
        None => {
            let h = parsed.host_str().ok_or_else(|| {
                OAuth1Error::InvalidRequest(
                    "base string URI has no host and no override was given".to_string(),
                )
            })?;
            let mut authority = h.to_ascii_lowercase();
            // Url::port() already hides scheme-default ports
            if let Some(port) = parsed.port() {
                let is_default = (scheme == "http" && port == 80)
                    || (scheme == "https" && port == 443);
                if !is_default {
                    authority = format!("{authority}:{port}");
                }
            }
            authority
        }
    };

    let path = match parsed.path() {
        "" => "/",
        p => p,
    };

    Ok(format!("{scheme}://{authority}{path}"))
}

/// Construct the signature base string from the already-prepared inputs:
/// uppercase method, then the percent-encoded URI and normalized parameter
/// string, joined with `&`.
#[must_use]
pub fn signature_base_string(
    method: &str,
    base_string_uri: &str,
    normalized_parameters: &str,
) -> String {
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(base_string_uri),
        percent_encode(normalized_parameters)
    )
}
