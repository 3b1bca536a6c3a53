//! Base64url helpers for JWK integer members.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rsa::BigUint;

/// Base64url (no padding) encoding of raw bytes.
#[must_use]
pub fn b64u(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Minimal big-endian unsigned byte string for `n`.
///
/// Zero encodes as a single `0x00` byte, never as an empty string.
#[must_use]
pub fn to_minimal_be_bytes(n: &BigUint) -> Vec<u8> {
    let bytes = n.to_bytes_be();
    let first_nonzero = bytes.iter().position(|b| *b != 0);
    match first_nonzero {
        Some(start) => bytes[start..].to_vec(),
        None => vec![0],
    }
}

/// Encode an unsigned integer as a JWK `n`/`e` member (RFC 7518 6.3.1).
#[must_use]
pub fn int_to_base64url(n: &BigUint) -> String {
    b64u(&to_minimal_be_bytes(n))
}
