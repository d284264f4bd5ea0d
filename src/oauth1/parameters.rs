//! Parameter collection and normalization (RFC 5849 §3.4.1.3).

use crate::http::Request;

use super::encode::{percent_decode, percent_encode};
use super::errors::OAuth1Error;

/// Parse an `Authorization: OAuth …` header value into decoded pairs.
///
/// Each comma-separated token must be `key="percent-encoded-value"`.
/// The `realm` pair is included; callers filter it as needed.
pub fn parse_authorization_header(
    value: &str,
) -> Result<Vec<(String, String)>, OAuth1Error> {
    let rest = value.strip_prefix("OAuth").ok_or_else(|| {
        OAuth1Error::InvalidRequest("Authorization header is not OAuth scheme".to_string())
    })?;

    let mut pairs = Vec::new();
    for token in rest.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (key, quoted) = token.split_once('=').ok_or_else(|| {
            OAuth1Error::InvalidRequest(format!("malformed Authorization token: {token}"))
        })?;
        let unquoted = quoted
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .ok_or_else(|| {
                OAuth1Error::InvalidRequest(format!("unquoted Authorization value for {key}"))
            })?;
        pairs.push((percent_decode(key.trim())?, percent_decode(unquoted)?));
    }
    Ok(pairs)
}

/// Collect the signable parameters of a request: URI query, form body, and
/// Authorization header, percent-decoded, in source order.
///
/// Duplicates are preserved; they are semantically meaningful and endpoint
/// validation rejects them explicitly. `oauth_signature` is always excluded
/// (it cannot sign itself); `realm` is excluded unless `with_realm` is set.
pub fn collect_parameters(
    request: &Request,
    with_realm: bool,
) -> Result<Vec<(String, String)>, OAuth1Error> {
    let mut params: Vec<(String, String)> = Vec::new();
    params.extend(request.query_pairs());
    if let Some(body) = request.body_pairs() {
        params.extend(body.iter().cloned());
    }
    if let Some(header) = request.header("Authorization") {
        params.extend(parse_authorization_header(header)?);
    }
    params.retain(|(k, _)| {
        k != "oauth_signature" && (with_realm || k != "realm")
    });
    Ok(params)
}

/// Normalize decoded parameters into the canonical string signed by the
/// base string: encode, sort by (encoded key, encoded value), join `k=v`
/// with `&`.
#[must_use]
pub fn normalize_parameters(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Format `oauth_*` parameters as an `Authorization: OAuth …` header value.
///
/// Pairs are comma-space separated with percent-encoded, quoted values;
/// `realm` comes first when present.
#[must_use]
pub fn format_authorization_header(
    params: &[(String, String)],
    realm: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(params.len() + 1);
    if let Some(realm) = realm {
        parts.push(format!("realm=\"{}\"", percent_encode(realm)));
    }
    for (k, v) in params {
        parts.push(format!(
            "{}=\"{}\"",
            percent_encode(k),
            percent_encode(v)
        ));
    }
    format!("OAuth {}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;

    #[test]
    fn parses_authorization_header() {
        let header = r#"OAuth realm="photos", oauth_consumer_key="dpf43f3p2l4k3l03", oauth_token="nnch734d00sl2jdk", oauth_nonce="a%20b""#;
        let pairs = parse_authorization_header(header).unwrap();
        assert_eq!(pairs[0], ("realm".to_string(), "photos".to_string()));
        assert_eq!(
            pairs[1],
            ("oauth_consumer_key".to_string(), "dpf43f3p2l4k3l03".to_string())
        );
        assert_eq!(pairs[3], ("oauth_nonce".to_string(), "a b".to_string()));
    }

    #[test]
    fn rejects_non_oauth_scheme() {
        assert!(parse_authorization_header("Bearer abc").is_err());
    }

    #[test]
    fn rejects_unquoted_values() {
        assert!(parse_authorization_header("OAuth oauth_nonce=abc").is_err());
    }

    #[test]
    fn collect_unions_all_sources_without_dedup() {
        let req = Request::new("POST", "https://example.com/r?a=1&a=2")
            .with_form_body(vec![("b".to_string(), "3".to_string())])
            .with_header("Authorization", r#"OAuth oauth_nonce="n1", realm="x""#);
        let params = collect_parameters(&req, false).unwrap();
        assert_eq!(
            params,
            vec![
                ("a".to_string(), "1".to_string()),
                ("a".to_string(), "2".to_string()),
                ("b".to_string(), "3".to_string()),
                ("oauth_nonce".to_string(), "n1".to_string()),
            ]
        );
    }

    #[test]
    fn collect_filters_realm_unless_requested() {
        let req = Request::new("POST", "https://example.com/r")
            .with_header("Authorization", r#"OAuth realm="x", oauth_nonce="n""#);
        let without = collect_parameters(&req, false).unwrap();
        assert!(without.iter().all(|(k, _)| k != "realm"));
        let with = collect_parameters(&req, true).unwrap();
        assert!(with.iter().any(|(k, _)| k == "realm"));
    }

    #[test]
    fn collect_excludes_oauth_signature() {
        let req = Request::new("POST", "https://example.com/r").with_header(
            "Authorization",
            r#"OAuth oauth_signature="sig", oauth_nonce="n""#,
        );
        let params = collect_parameters(&req, false).unwrap();
        assert!(params.iter().all(|(k, _)| k != "oauth_signature"));
    }

    #[test]
    fn normalization_sorts_by_encoded_key_then_value() {
        let params = vec![
            ("z".to_string(), "1".to_string()),
            ("a".to_string(), "two words".to_string()),
        ];
        assert_eq!(normalize_parameters(&params), "a=two%20words&z=1");
    }

    #[test]
    fn normalization_is_order_insensitive() {
        let a = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
            ("a".to_string(), "0".to_string()),
        ];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(normalize_parameters(&a), normalize_parameters(&b));
        assert_eq!(normalize_parameters(&a), "a=0&a=1&b=2");
    }

    #[test]
    fn header_formatting_puts_realm_first() {
        let params = vec![
            ("oauth_consumer_key".to_string(), "key".to_string()),
            ("oauth_signature".to_string(), "a=b+c".to_string()),
        ];
        let header = format_authorization_header(&params, Some("photos"));
        assert!(header.starts_with("OAuth realm=\"photos\", oauth_consumer_key=\"key\""));
        assert!(header.contains("oauth_signature=\"a%3Db%2Bc\""));
    }
}
