//! Error responses.
//!
//! Every failure is answered with a JSON `{ "message": ... }` body, the shape
//! the client surfaces to the resident.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StubError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    /// Failure injected through [`AppState::fail_next`](crate::AppState::fail_next).
    /// Carries no message so clients fall back to their generic text.
    #[error("injected failure")]
    Injected,
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let status = match &self {
            StubError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            StubError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StubError::Injected => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::debug!(status = status.as_u16(), "rejecting request: {self}");
        let body = match self {
            StubError::Injected => json!({ "error": "internal" }),
            other => json!({ "message": other.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
