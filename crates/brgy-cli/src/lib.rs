//! # brgy-cli — Barangay Requests Command-Line Interface
//!
//! ## Subcommands
//!
//! - `spec` — Print a form specification as JSON
//! - `session` — Show, set or clear the local session
//! - `submit` — Fill and submit a request through the guided form controller
//! - `logout` — End the session at the gateway and clear it locally
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to `brgy-form` and `brgy-schema`; no form logic here.
//! - Handlers return a process exit code: 0 success, 1 failure, 2 invalid
//!   input.

use std::path::PathBuf;

pub mod auth;
pub mod session;
pub mod spec;
pub mod submit;

/// Environment variable naming the session file.
pub const SESSION_PATH_VAR: &str = "BRGY_SESSION_PATH";

/// Session file location: the `--session` flag, then `BRGY_SESSION_PATH`,
/// then `~/.brgy/session.json`.
pub fn resolve_session_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(SESSION_PATH_VAR).map(PathBuf::from))
        .unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".brgy")
                .join("session.json")
        })
}
