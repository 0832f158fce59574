//! # brgy-gateway-stub — Development Gateway
//!
//! In-memory implementation of the gateway endpoints the client calls:
//!
//! | Route | Success |
//! |---|---|
//! | `POST /api/incident-report/submit` | 201 |
//! | `POST /api/document-request/submit` | 201 |
//! | `POST /api/auth/logout` | 200 |
//! | `GET /api/submissions` | 200, stored submissions |
//! | `GET /health` | 200 |
//!
//! Submissions require a bearer token; logout revokes the presented token.
//! Storage is a DashMap with no persistence; data is lost on restart.

pub mod error;
pub mod routes;
pub mod store;

pub use error::StubError;
pub use routes::router;
pub use store::{AppState, StoredSubmission};
