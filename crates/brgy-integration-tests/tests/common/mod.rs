//! Shared fixtures: an in-process gateway stub and a signed-in session.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use brgy_client::{ApiClient, ApiConfig};
use brgy_core::{Identity, SessionToken};
use brgy_form::{HttpGateway, SessionStore};
use brgy_gateway_stub::AppState;

pub struct Stub {
    pub port: u16,
    pub state: AppState,
    _shutdown: tokio::sync::oneshot::Sender<()>,
}

impl Stub {
    pub fn config(&self) -> ApiConfig {
        ApiConfig::local_mock(self.port).unwrap()
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.config()).unwrap()
    }
}

/// Start the gateway stub on a random port.
pub async fn start_stub() -> Stub {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind to random port");
    let port = listener.local_addr().unwrap().port();
    let state = AppState::new();
    let app = brgy_gateway_stub::router(state.clone());
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async {
                rx.await.ok();
            })
            .await
            .ok();
    });

    // Wait for the server to be ready.
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    Stub {
        port,
        state,
        _shutdown: tx,
    }
}

pub fn juan() -> Identity {
    Identity {
        name: Some("Juan Dela Cruz".into()),
        email: Some("juan@example.ph".into()),
        barangay: Some("San Isidro".into()),
    }
}

/// A session file at `path` holding a token and Juan's identity.
pub fn signed_in(path: &Path) -> Arc<SessionStore> {
    let store = SessionStore::open(path).unwrap();
    store
        .save(SessionToken::new("resident-token").unwrap(), juan())
        .unwrap();
    Arc::new(store)
}

pub fn gateway(stub: &Stub, session: &Arc<SessionStore>) -> Arc<HttpGateway> {
    Arc::new(HttpGateway::new(stub.client(), session.clone()))
}
