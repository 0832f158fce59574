//! Gateway stub server, for local development against the forms and CLI.

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use brgy_gateway_stub::{router, AppState};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("BRGY_STUB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5000);

    let app = router(AppState::new());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("brgy-gateway-stub listening on {addr}");
    axum::serve(listener, app.into_make_service()).await
}
