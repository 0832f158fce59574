//! # Logout Subcommand

use std::path::Path;

use anyhow::{Context, Result};

use brgy_client::{ApiClient, ApiConfig};
use brgy_form::SessionStore;

pub async fn run_logout(session_path: &Path) -> Result<u8> {
    let config = ApiConfig::from_env().context("loading gateway configuration")?;
    logout_with(config, session_path).await
}

/// Log out against the gateway at `config`.
pub async fn logout_with(config: ApiConfig, session_path: &Path) -> Result<u8> {
    let store = SessionStore::open(session_path)
        .with_context(|| format!("opening session {}", session_path.display()))?;
    let client = ApiClient::new(config)?;
    store.logout(client.auth()).await.context("logging out")?;
    println!("OK: signed out");
    Ok(0)
}
