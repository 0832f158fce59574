//! # brgy CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use brgy_cli::auth::run_logout;
use brgy_cli::resolve_session_path;
use brgy_cli::session::{run_session, SessionArgs};
use brgy_cli::spec::{run_spec, SpecArgs};
use brgy_cli::submit::{run_submit, SubmitArgs};

/// Barangay requests from the command line.
///
/// Prints form specifications, manages the local session, and submits
/// clearance, cedula and incident report requests to the records gateway
/// (`BRGY_API_URL`, default http://localhost:5000).
#[derive(Parser, Debug)]
#[command(name = "brgy", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the session file (default: $BRGY_SESSION_PATH, then
    /// ~/.brgy/session.json).
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the specification of a form as JSON.
    Spec(SpecArgs),

    /// Show, set or clear the local session.
    Session(SessionArgs),

    /// Fill and submit a request.
    Submit(SubmitArgs),

    /// End the session at the gateway and clear it locally.
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let session_path = resolve_session_path(cli.session);
    tracing::debug!(session = %session_path.display(), "resolved session file");

    let result = match cli.command {
        Commands::Spec(args) => run_spec(&args),
        Commands::Session(args) => run_session(&args, &session_path),
        Commands::Submit(args) => run_submit(&args, &session_path).await,
        Commands::Logout => run_logout(&session_path).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
