//! # brgy-client — Typed HTTP Client for the Records Gateway
//!
//! The only path by which the form crates talk to the backend. Two
//! sub-clients share one `reqwest::Client`:
//!
//! - [`SubmissionClient`] posts [`SubmissionPayload`](brgy_core::SubmissionPayload)s
//!   to the incident-report or document-request endpoint;
//! - [`AuthClient`] ends the session.
//!
//! The bearer token is passed per call rather than baked into default
//! headers, because it lives in the session store and may change between
//! requests.

pub mod auth;
pub mod config;
pub mod error;
pub(crate) mod retry;
pub mod submission;

pub use auth::AuthClient;
pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, GENERIC_FAILURE};
pub use submission::{route_for, ExpectedStatus, SubmissionClient, SubmissionReceipt};

use std::time::Duration;

/// Top-level gateway client. Holds one sub-client per endpoint group.
#[derive(Debug, Clone)]
pub struct ApiClient {
    submissions: SubmissionClient,
    auth: AuthClient,
}

impl ApiClient {
    /// Create a gateway client from configuration.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("brgy-client/", env!("CARGO_PKG_VERSION")))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()
            .map_err(|e| ApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            submissions: SubmissionClient::new(http.clone(), config.clone()),
            auth: AuthClient::new(http, config),
        })
    }

    /// Access the submission client.
    pub fn submissions(&self) -> &SubmissionClient {
        &self.submissions
    }

    /// Access the auth client.
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }
}
