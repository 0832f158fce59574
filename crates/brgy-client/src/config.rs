//! Gateway client configuration.
//!
//! Defaults point at the development backend on `localhost:5000`. Override
//! via environment variables or explicit construction for staging/testing.

use url::Url;

/// Default gateway base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Configuration for connecting to the records gateway.
///
/// The session token is not part of the configuration: it is read from the
/// session store on every request, so logging in or out takes effect
/// without rebuilding the client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the gateway. Paths such as `/api/auth/logout` are joined
    /// onto it.
    pub base_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a failed connect. Requests that reached the gateway
    /// are never resent. 0 disables retry.
    pub max_retries: u32,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `BRGY_API_URL` (default: `http://localhost:5000`)
    /// - `BRGY_TIMEOUT_SECS` (default: 30)
    /// - `BRGY_MAX_RETRIES` (default: 0)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_url("BRGY_API_URL", DEFAULT_BASE_URL)?,
            timeout_secs: env_number("BRGY_TIMEOUT_SECS", 30)?,
            max_retries: env_number("BRGY_MAX_RETRIES", 0)?,
        })
    }

    /// Configuration pointing at a local stub or mock server.
    pub fn local_mock(port: u16) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&format!("http://127.0.0.1:{port}"))
            .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))?;
        Ok(Self {
            base_url,
            timeout_secs: 5,
            max_retries: 0,
        })
    }

    /// Configuration for an explicit base URL with default timeouts.
    pub fn with_base_url(raw: &str) -> Result<Self, ConfigError> {
        let base_url =
            Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(raw.to_string(), e.to_string()))?;
        Ok(Self {
            base_url,
            timeout_secs: 30,
            max_retries: 0,
        })
    }

    /// Join an absolute API path onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        self.base_url
            .join(path)
            .map_err(|e| ConfigError::InvalidUrl(path.to_string(), e.to_string()))
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_number<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            var: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = ApiConfig::local_mock(9000).unwrap();
        assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.max_retries, 0);
    }

    #[test]
    fn endpoint_joins_absolute_paths() {
        let cfg = ApiConfig::with_base_url("http://records.example.ph/gateway/").unwrap();
        let url = cfg.endpoint("/api/auth/logout").unwrap();
        assert_eq!(url.as_str(), "http://records.example.ph/api/auth/logout");
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("BRGY_NONEXISTENT_VAR_12345", DEFAULT_BASE_URL).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/");
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("BRGY_TEST_BAD_URL", "not a url");
        let result = env_url("BRGY_TEST_BAD_URL", DEFAULT_BASE_URL);
        std::env::remove_var("BRGY_TEST_BAD_URL");
        assert!(result.is_err());
    }

    #[test]
    fn env_number_rejects_garbage() {
        std::env::set_var("BRGY_TEST_BAD_RETRIES", "three");
        let result: Result<u32, _> = env_number("BRGY_TEST_BAD_RETRIES", 0);
        std::env::remove_var("BRGY_TEST_BAD_RETRIES");
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
    }
}
