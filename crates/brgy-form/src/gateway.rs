//! # Submission Gateway
//!
//! The controller hands finished payloads to a [`SubmissionGateway`]. The
//! production implementation is [`HttpGateway`], which reads the bearer
//! token from a [`TokenSource`] on every call.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use brgy_client::{ApiClient, ApiError, SubmissionReceipt};
use brgy_core::SubmissionPayload;

use crate::session::TokenSource;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("no session token; sign in before submitting")]
    NotSignedIn,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl GatewayError {
    /// Reason shown to the resident when the submission fails.
    pub fn reason(&self) -> String {
        match self {
            Self::NotSignedIn => "You must be signed in to submit a request.".to_string(),
            Self::Api(e) => e.user_message(),
        }
    }

    /// HTTP status of a gateway rejection, if the gateway answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(ApiError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, GatewayError>;
}

/// Gateway backed by the HTTP client.
#[derive(Clone)]
pub struct HttpGateway {
    client: ApiClient,
    tokens: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    pub fn new(client: ApiClient, tokens: Arc<dyn TokenSource>) -> Self {
        Self { client, tokens }
    }
}

#[async_trait]
impl SubmissionGateway for HttpGateway {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, GatewayError> {
        let token = self.tokens.token().ok_or(GatewayError::NotSignedIn)?;
        Ok(self.client.submissions().submit(payload, &token).await?)
    }
}
