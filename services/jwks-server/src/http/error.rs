//! HTTP mapping for [`KeyServiceError`].
//!
//! Every core error is a server-side condition and maps to 500. Details are
//! logged; the body carries only the code and a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::error::KeyServiceError;

/// JSON error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Stable error code
    pub error: String,
    /// Human-readable message
    pub message: String,
}

impl KeyServiceError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for KeyServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!(code = self.code(), error = %self, "Request failed");
        let body = ErrorBody {
            error: self.code().to_string(),
            message: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// 404 for unknown paths and unsupported methods.
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not found" })),
    )
        .into_response()
}
