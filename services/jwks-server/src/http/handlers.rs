//! Route handlers.

use std::collections::HashMap;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use super::request::{resolve_subject, use_expired_key};
use super::AppState;
use crate::error::Result;
use crate::jwks::Jwks;
use crate::jwt::IssuedToken;
use crate::metrics;

/// Body of a successful `POST /auth`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    /// Signed compact JWS
    pub token: String,
    /// Which key signed the token and the token's window
    pub meta: TokenMeta,
}

/// Informational metadata about an issued token.
#[derive(Debug, Clone, Serialize)]
pub struct TokenMeta {
    /// `kid` header of the token
    pub kid: String,
    /// `valid` or `expired`
    pub key_class: &'static str,
    /// Expiry of the signing key
    pub key_expires_at: i64,
    /// `iat` claim
    pub iat: i64,
    /// `exp` claim
    pub exp: i64,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            meta: TokenMeta {
                kid: issued.kid.to_string(),
                key_class: issued.key_class.as_str(),
                key_expires_at: issued.key_expires_at,
                iat: issued.issued_at,
                exp: issued.expires_at,
            },
            token: issued.token,
        }
    }
}

/// `GET /.well-known/jwks.json`
pub async fn jwks(State(state): State<AppState>) -> Result<Json<Jwks>> {
    let started = Instant::now();
    let result = state.publisher.current().await;
    metrics::record_http_latency("jwks", started.elapsed().as_secs_f64());
    Ok(Json(result?))
}

/// `POST /auth`
///
/// The body is read raw so that a missing or non-JSON body still gets a
/// token for the default subject.
pub async fn auth(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TokenResponse>> {
    let started = Instant::now();
    let subject = resolve_subject(&headers, &body, &state.default_subject);
    let result = state.issuer.issue(use_expired_key(&query), &subject).await;
    metrics::record_http_latency("auth", started.elapsed().as_secs_f64());

    Ok(Json(TokenResponse::from(result?)))
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

/// `GET /metrics`
pub async fn metrics() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}
