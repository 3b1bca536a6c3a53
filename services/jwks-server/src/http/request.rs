//! Best-effort request parsing.
//!
//! Nothing here fails a request: malformed input falls back to defaults.

use std::collections::HashMap;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Whether the query asks for the expired signing key.
///
/// `expired` counts when present with an empty value or any value other than
/// `0`, `false`, `no` or `off`.
#[must_use]
pub fn use_expired_key(query: &HashMap<String, String>) -> bool {
    match query.get("expired") {
        None => false,
        Some(value) => !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
    }
}

/// Subject for an issuance request.
///
/// A `Basic` authorization header wins (its user part, or the default if it
/// cannot be decoded). Otherwise the JSON body's `username` string is used.
#[must_use]
pub fn resolve_subject(headers: &HeaderMap, body: &[u8], default_subject: &str) -> String {
    let basic = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("Basic "));

    let subject = match basic {
        Some(value) => basic_auth_user(value),
        None => body_username(body),
    };
    subject.unwrap_or_else(|| default_subject.to_string())
}

fn basic_auth_user(header: &str) -> Option<String> {
    let encoded = header.split_whitespace().nth(1)?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let user = credentials.split(':').next()?;
    (!user.is_empty()).then(|| user.to_string())
}

fn body_username(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let username = value.get("username")?.as_str()?;
    (!username.is_empty()).then(|| username.to_string())
}
