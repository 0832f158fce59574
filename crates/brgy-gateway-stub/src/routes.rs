//! Route definitions for the gateway stub.
//!
//! Implements the endpoints the client calls, with the status codes and
//! `{ "message": ... }` bodies the real gateway answers with.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use brgy_core::{DocumentKind, SubmissionPayload};

use crate::error::StubError;
use crate::store::{AppState, StoredSubmission};

/// Build the complete router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/incident-report/submit", post(incident_submit))
        .route("/api/document-request/submit", post(document_submit))
        .route("/api/auth/logout", post(logout))
        .route("/api/submissions", get(list_submissions))
        // Fallback: 501 Not Implemented
        .fallback(not_implemented)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn not_implemented() -> StatusCode {
    StatusCode::NOT_IMPLEMENTED
}

// ── Submissions ─────────────────────────────────────────────────────

/// Fields the incident endpoint refuses to accept without.
const INCIDENT_REQUIRED: &[(&str, &str)] = &[
    ("category", "Category"),
    ("subCategory", "Sub-category"),
    ("description", "Description"),
];

async fn incident_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StubError> {
    bearer(&state, &headers)?;
    let (payload, raw) = parse_payload(&body)?;
    if payload.document_kind() != DocumentKind::IncidentReport {
        return Err(StubError::BadRequest(format!(
            "Expected an incident report, got {}",
            payload.document_kind()
        )));
    }
    require_text(&payload, INCIDENT_REQUIRED)?;
    accept(&state, payload, raw, "Incident report submitted successfully")
}

async fn document_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StubError> {
    bearer(&state, &headers)?;
    let (payload, raw) = parse_payload(&body)?;
    if !payload.document_kind().is_document_request() {
        return Err(StubError::BadRequest(format!(
            "{} is not a document request",
            payload.document_kind()
        )));
    }
    require_text(&payload, &[("name", "Full name")])?;
    accept(&state, payload, raw, "Document request submitted successfully")
}

fn accept(
    state: &AppState,
    payload: SubmissionPayload,
    raw: Value,
    message: &str,
) -> Result<Response, StubError> {
    if state.take_failure() {
        tracing::info!(document_kind = %payload.document_kind(), "answering with injected failure");
        return Err(StubError::Injected);
    }
    let id = Uuid::new_v4();
    let stored = StoredSubmission {
        id,
        document_kind: payload.document_kind(),
        received_at: Utc::now(),
        evidence_count: payload.evidence().len(),
        payload: raw,
    };
    tracing::info!(
        %id,
        document_kind = %stored.document_kind,
        evidence = stored.evidence_count,
        "submission stored"
    );
    state.submissions().insert(id, stored);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": message, "_id": id.to_string() })),
    )
        .into_response())
}

async fn list_submissions(State(state): State<AppState>) -> Json<Vec<StoredSubmission>> {
    Json(state.submissions_by_arrival())
}

// ── Auth ────────────────────────────────────────────────────────────

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    if let Some(token) = bearer_token(&headers) {
        state.revoke(token);
        tracing::info!("session token revoked");
    }
    Json(json!({ "message": "Logged out successfully" }))
}

// ── Helpers ─────────────────────────────────────────────────────────

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn bearer(state: &AppState, headers: &HeaderMap) -> Result<(), StubError> {
    let token = bearer_token(headers)
        .ok_or_else(|| StubError::Unauthorized("Not authorized, no token".into()))?;
    if state.is_revoked(token) {
        return Err(StubError::Unauthorized(
            "Session has ended. Please sign in again.".into(),
        ));
    }
    Ok(())
}

/// Parse the body both as raw JSON (stored verbatim) and as a tagged payload.
fn parse_payload(body: &[u8]) -> Result<(SubmissionPayload, Value), StubError> {
    let raw: Value = serde_json::from_slice(body)
        .map_err(|e| StubError::BadRequest(format!("Request body is not JSON: {e}")))?;
    let payload: SubmissionPayload = serde_json::from_value(raw.clone())
        .map_err(|e| StubError::BadRequest(format!("Invalid submission: {e}")))?;
    Ok((payload, raw))
}

fn require_text(payload: &SubmissionPayload, required: &[(&str, &str)]) -> Result<(), StubError> {
    for (key, label) in required {
        if payload.text(key).map_or(true, |v| v.trim().is_empty()) {
            return Err(StubError::BadRequest(format!("{label} is required")));
        }
    }
    Ok(())
}
