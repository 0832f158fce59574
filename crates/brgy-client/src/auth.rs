//! Session endpoint: `POST /api/auth/logout`, success = 200.

use reqwest::StatusCode;

use brgy_core::SessionToken;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::submission::rejection;

pub const LOGOUT_PATH: &str = "/api/auth/logout";

/// Client for the authentication endpoints the forms need.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl AuthClient {
    pub(crate) fn new(http: reqwest::Client, config: ApiConfig) -> Self {
        Self { http, config }
    }

    /// End the server-side session.
    ///
    /// The token is sent when present; the gateway accepts anonymous logout.
    /// Only a 200 counts as success, and only then should the caller discard
    /// its local session.
    pub async fn logout(&self, token: Option<&SessionToken>) -> Result<(), ApiError> {
        let endpoint = format!("POST {LOGOUT_PATH}");
        let url = self.config.endpoint(LOGOUT_PATH)?;

        let resp = crate::retry::retry_send(self.config.max_retries, || {
            let req = self.http.post(url.clone());
            match token {
                Some(token) => req.bearer_auth(token.expose()).send(),
                None => req.send(),
            }
        })
        .await
        .map_err(|e| ApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        if resp.status() != StatusCode::OK {
            return Err(rejection(endpoint, resp).await);
        }
        tracing::info!("logged out of gateway");
        Ok(())
    }
}
