//! Gateway client error types.

/// Message shown when the gateway gives no usable reason.
pub const GENERIC_FAILURE: &str = "Failed to submit request. Please try again.";

/// Errors from gateway calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP transport error (connection refused, timeout, TLS).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The gateway answered with a status other than the expected one.
    #[error("{endpoint} returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        endpoint: String,
        status: u16,
        /// `message` from a JSON `{ "message": ... }` error body, if any.
        message: Option<String>,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl ApiError {
    /// Text to show the resident: the gateway's own message when it sent
    /// one, otherwise a generic retry prompt.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    /// Whether a transport failure (not a gateway verdict) caused this.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http { .. })
    }
}
