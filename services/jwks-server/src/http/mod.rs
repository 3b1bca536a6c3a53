//! HTTP surface of the JWKS server.
//!
//! Routes:
//! - `GET /.well-known/jwks.json`: public keys currently valid
//! - `POST /auth`: issue a token (`?expired` signs with the expired key)
//! - `GET /health`, `GET /metrics`
//!
//! Any other path or method gets a JSON 404.

pub mod error;
pub mod handlers;
pub mod request;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::jwks::JwksPublisher;
use crate::jwt::TokenIssuer;
use crate::storage::SharedKeyStore;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Token issuance
    pub issuer: TokenIssuer,
    /// JWKS publication
    pub publisher: JwksPublisher,
    /// Subject for requests that name none
    pub default_subject: Arc<str>,
}

impl AppState {
    /// State over `store` with explicit issuer and subject defaults.
    #[must_use]
    pub fn new(store: SharedKeyStore, issuer: TokenIssuer, default_subject: &str) -> Self {
        Self {
            issuer,
            publisher: JwksPublisher::new(store),
            default_subject: Arc::from(default_subject),
        }
    }

    /// State configured from [`Config`].
    #[must_use]
    pub fn from_config(store: SharedKeyStore, config: &Config) -> Self {
        let issuer = TokenIssuer::from_config(store.clone(), config);
        Self::new(store, issuer, &config.default_subject)
    }
}

/// Build the router with tracing middleware.
pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
            )
        });

    Router::new()
        .route(
            "/.well-known/jwks.json",
            get(handlers::jwks).fallback(error::not_found),
        )
        .route("/auth", post(handlers::auth).fallback(error::not_found))
        .route("/health", get(handlers::health).fallback(error::not_found))
        .route("/metrics", get(handlers::metrics).fallback(error::not_found))
        .fallback(error::not_found)
        .layer(trace_layer)
        .with_state(state)
}
