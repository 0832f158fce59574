//! # Environment Probe
//!
//! Decides whether the date fields should use the native date input or the
//! calendar popover. The native picker is only trusted in Chrome-like
//! browsers: the user agent mentions `chrome` but neither `edg` nor `opr`,
//! and the browser does not identify itself as a privacy browser.
//!
//! Detection is asynchronous and never fails from the caller's point of
//! view: an unavailable, failing or slow privacy check counts as "not a
//! privacy browser".

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Rendering choices that depend on the client environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentProfile {
    /// Render date fields with the native date input. Defaults to `false`
    /// (calendar popover) until detection completes.
    pub use_native_date_input: bool,
}

impl EnvironmentProfile {
    pub const NATIVE: Self = Self {
        use_native_date_input: true,
    };
}

#[async_trait]
pub trait EnvironmentProbe: Send + Sync {
    async fn detect(&self) -> EnvironmentProfile;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("privacy browser check unavailable: {0}")]
    Unavailable(String),
}

/// Self-identification check of a privacy-focused browser that otherwise
/// presents a Chrome user agent.
#[async_trait]
pub trait PrivacyBrowserCheck: Send + Sync {
    async fn is_privacy_browser(&self) -> Result<bool, ProbeError>;
}

/// How long the privacy check may take before it counts as absent.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Probe driven by a user-agent string and an optional privacy check.
#[derive(Clone)]
pub struct UserAgentProbe {
    user_agent: String,
    privacy_check: Option<Arc<dyn PrivacyBrowserCheck>>,
    check_timeout: Duration,
}

impl std::fmt::Debug for UserAgentProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAgentProbe")
            .field("user_agent", &self.user_agent)
            .field("privacy_check", &self.privacy_check.is_some())
            .field("check_timeout", &self.check_timeout)
            .finish()
    }
}

impl UserAgentProbe {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            privacy_check: None,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    pub fn with_privacy_check(mut self, check: Arc<dyn PrivacyBrowserCheck>) -> Self {
        self.privacy_check = Some(check);
        self
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    async fn privacy_browser(&self) -> bool {
        let Some(check) = &self.privacy_check else {
            return false;
        };
        match tokio::time::timeout(self.check_timeout, check.is_privacy_browser()).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                tracing::debug!("privacy browser check failed, assuming none: {e}");
                false
            }
            Err(_) => {
                tracing::debug!(timeout = ?self.check_timeout, "privacy browser check timed out, assuming none");
                false
            }
        }
    }
}

#[async_trait]
impl EnvironmentProbe for UserAgentProbe {
    async fn detect(&self) -> EnvironmentProfile {
        let chrome_like = is_chrome_like(&self.user_agent);
        // The check only matters for an otherwise Chrome-like agent.
        let privacy = chrome_like && self.privacy_browser().await;
        let profile = EnvironmentProfile {
            use_native_date_input: chrome_like && !privacy,
        };
        tracing::debug!(
            user_agent = %self.user_agent,
            chrome_like,
            privacy_browser = privacy,
            native_date_input = profile.use_native_date_input,
            "environment probe resolved"
        );
        profile
    }
}

/// Probe that always reports the same profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedProbe(pub EnvironmentProfile);

#[async_trait]
impl EnvironmentProbe for FixedProbe {
    async fn detect(&self) -> EnvironmentProfile {
        self.0
    }
}

/// `chrome` present, `edg` and `opr` absent, case-insensitive.
pub fn is_chrome_like(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    ua.contains("chrome") && !ua.contains("edg") && !ua.contains("opr")
}
