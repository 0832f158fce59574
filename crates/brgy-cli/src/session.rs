//! # Session Subcommand
//!
//! Inspect and edit the local session file that identity-bound fields are
//! filled from. `set` only overwrites the attributes it is given.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::json;

use brgy_core::{Identity, SessionToken};
use brgy_form::SessionStore;

/// Arguments for the `brgy session` subcommand.
#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Print the stored identity and whether a token is present.
    Show,

    /// Store identity attributes and, optionally, a bearer token.
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        barangay: Option<String>,
        /// Bearer token issued by the gateway at login.
        #[arg(long)]
        token: Option<String>,
    },

    /// Forget token and identity.
    Clear,
}

pub fn run_session(args: &SessionArgs, session_path: &Path) -> Result<u8> {
    let store = SessionStore::open(session_path)
        .with_context(|| format!("opening session {}", session_path.display()))?;

    match &args.command {
        SessionCommand::Show => {
            println!("{}", show(&store)?);
        }
        SessionCommand::Set {
            name,
            email,
            barangay,
            token,
        } => {
            let mut identity = store.identity();
            merge(&mut identity.name, name);
            merge(&mut identity.email, email);
            merge(&mut identity.barangay, barangay);
            match token {
                Some(raw) => {
                    let token = SessionToken::new(raw.as_str()).context("invalid token")?;
                    store.save(token, identity)?;
                }
                None => store.set_identity(identity)?,
            }
            println!("OK: session saved to {}", store.path().display());
        }
        SessionCommand::Clear => {
            store.clear()?;
            println!("OK: session cleared");
        }
    }
    Ok(0)
}

fn show(store: &SessionStore) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json!({
        "path": store.path().display().to_string(),
        "signedIn": store.is_signed_in(),
        "user": store.identity(),
    }))?)
}

fn merge(slot: &mut Option<String>, given: &Option<String>) {
    if let Some(value) = given {
        *slot = Some(value.clone());
    }
}
