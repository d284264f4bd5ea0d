//! Random artifact generation.
//!
//! Every generator draws fresh bytes from the thread-local CSPRNG per call;
//! there is no shared counter, so concurrent callers never contend.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Generate an opaque token of `n_bytes` random bytes, base64url-encoded
/// without padding.
#[must_use]
pub fn random_token(n_bytes: usize) -> String {
    let mut bytes = vec![0u8; n_bytes];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a random nonce: 16 bytes, lowercase hex.
///
/// Hex keeps the nonce header-safe without further quoting rules.
#[must_use]
pub fn random_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Current Unix timestamp in seconds
#[must_use]
pub fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
