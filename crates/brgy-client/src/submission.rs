//! Typed client for the request submission endpoints.
//!
//! | Method | Path | Document kinds | Success |
//! |--------|------|----------------|---------|
//! | POST | `/api/incident-report/submit` | `incident-report` | 201 only |
//! | POST | `/api/document-request/submit` | `barangay-clearance`, `cedula` | any 2xx |
//!
//! Both endpoints take the payload as JSON with `Authorization: Bearer`.
//! Error bodies are `{ "message": "..." }`.

use reqwest::StatusCode;
use serde::Deserialize;

use brgy_core::{DocumentKind, SessionToken, SubmissionPayload};

use crate::config::ApiConfig;
use crate::error::ApiError;

pub const INCIDENT_REPORT_PATH: &str = "/api/incident-report/submit";
pub const DOCUMENT_REQUEST_PATH: &str = "/api/document-request/submit";

/// Which statuses count as acceptance for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedStatus {
    Exactly(StatusCode),
    AnySuccess,
}

impl ExpectedStatus {
    pub fn accepts(&self, status: StatusCode) -> bool {
        match self {
            Self::Exactly(expected) => status == *expected,
            Self::AnySuccess => status.is_success(),
        }
    }
}

/// Endpoint path and acceptance rule for a document kind.
pub fn route_for(kind: DocumentKind) -> (&'static str, ExpectedStatus) {
    match kind {
        DocumentKind::IncidentReport => {
            (INCIDENT_REPORT_PATH, ExpectedStatus::Exactly(StatusCode::CREATED))
        }
        DocumentKind::BarangayClearance | DocumentKind::Cedula => {
            (DOCUMENT_REQUEST_PATH, ExpectedStatus::AnySuccess)
        }
    }
}

/// What the gateway said when it accepted a submission.
///
/// The body is optional; unparseable bodies leave `message` and `id` empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(skip)]
    pub status: u16,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Client for the submission endpoints.
#[derive(Debug, Clone)]
pub struct SubmissionClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl SubmissionClient {
    pub(crate) fn new(http: reqwest::Client, config: ApiConfig) -> Self {
        Self { http, config }
    }

    /// Submit a payload to the endpoint for its document kind.
    ///
    /// Connect failures are retried up to `max_retries` times. A response
    /// whose status the endpoint does not accept becomes
    /// [`ApiError::Rejected`], carrying the gateway's message if it sent one.
    pub async fn submit(
        &self,
        payload: &SubmissionPayload,
        token: &SessionToken,
    ) -> Result<SubmissionReceipt, ApiError> {
        let (path, expected) = route_for(payload.document_kind());
        let endpoint = format!("POST {path}");
        let url = self.config.endpoint(path)?;

        tracing::info!(
            document_kind = %payload.document_kind(),
            evidence = payload.evidence().len(),
            "submitting request to gateway"
        );

        let resp = crate::retry::retry_send(self.config.max_retries, || {
            self.http
                .post(url.clone())
                .bearer_auth(token.expose())
                .json(payload)
                .send()
        })
        .await
        .map_err(|e| ApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let status = resp.status();
        if !expected.accepts(status) {
            return Err(rejection(endpoint, resp).await);
        }

        let body = resp.bytes().await.map_err(|e| ApiError::Deserialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        let mut receipt = if body.is_empty() {
            SubmissionReceipt::default()
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|e| {
                tracing::debug!(%endpoint, "ignoring unparseable success body: {e}");
                SubmissionReceipt::default()
            })
        };
        receipt.status = status.as_u16();
        Ok(receipt)
    }
}

/// Turn an unaccepted response into [`ApiError::Rejected`].
pub(crate) async fn rejection(endpoint: String, resp: reqwest::Response) -> ApiError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message);
    tracing::warn!(%endpoint, status, "gateway rejected request");
    ApiError::Rejected {
        endpoint,
        status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incident_reports_require_created() {
        let (path, expected) = route_for(DocumentKind::IncidentReport);
        assert_eq!(path, INCIDENT_REPORT_PATH);
        assert!(expected.accepts(StatusCode::CREATED));
        assert!(!expected.accepts(StatusCode::OK));
    }

    #[test]
    fn document_requests_accept_any_success() {
        for kind in [DocumentKind::BarangayClearance, DocumentKind::Cedula] {
            let (path, expected) = route_for(kind);
            assert_eq!(path, DOCUMENT_REQUEST_PATH);
            assert!(expected.accepts(StatusCode::OK));
            assert!(expected.accepts(StatusCode::ACCEPTED));
            assert!(!expected.accepts(StatusCode::BAD_REQUEST));
        }
    }
}
