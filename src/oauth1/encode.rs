//! RFC 5849 §3.6 percent-encoding.
//!
//! OAuth signing does NOT use standard URL encoding: only the RFC 3986
//! unreserved characters (ALPHA / DIGIT / `-` / `.` / `_` / `~`) pass
//! through; everything else, space included, becomes `%XX`.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use super::errors::OAuth1Error;

/// Every ASCII byte outside the RFC 3986 unreserved set.
///
/// `percent_encoding` sets are additive, so the reserved characters are
/// enumerated explicitly on top of the control range.
const OAUTH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'!')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encode per RFC 5849 §3.6
#[must_use]
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Percent-decode a text-safe input.
///
/// Inputs that decode to non-UTF-8 bytes are rejected; the normalizer only
/// operates on decoded text.
pub fn percent_decode(s: &str) -> Result<String, OAuth1Error> {
    percent_encoding::percent_decode_str(s)
        .decode_utf8()
        .map(|cow| cow.into_owned())
        .map_err(|_| {
            OAuth1Error::InvalidRequest("percent-encoded value is not valid UTF-8".to_string())
        })
}
