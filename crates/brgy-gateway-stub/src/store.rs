//! In-memory storage backed by DashMap.
//!
//! Accepted submissions are kept by id; tokens presented to the logout
//! endpoint are remembered and refused afterwards.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use brgy_core::DocumentKind;

/// One accepted submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSubmission {
    pub id: Uuid,
    pub document_kind: DocumentKind,
    pub received_at: DateTime<Utc>,
    pub evidence_count: usize,
    pub payload: Value,
}

struct Inner {
    submissions: DashMap<Uuid, StoredSubmission>,
    revoked: DashMap<String, DateTime<Utc>>,
    failures_pending: AtomicUsize,
}

/// Shared server state. Clones share the same data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                submissions: DashMap::new(),
                revoked: DashMap::new(),
                failures_pending: AtomicUsize::new(0),
            }),
        }
    }

    pub fn submissions(&self) -> &DashMap<Uuid, StoredSubmission> {
        &self.inner.submissions
    }

    /// Submissions ordered by arrival.
    pub fn submissions_by_arrival(&self) -> Vec<StoredSubmission> {
        let mut all: Vec<StoredSubmission> =
            self.inner.submissions.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|s| s.received_at);
        all
    }

    pub fn revoke(&self, token: &str) {
        self.inner.revoked.insert(token.to_string(), Utc::now());
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.inner.revoked.contains_key(token)
    }

    /// Answer the next `count` submissions with a 500.
    pub fn fail_next(&self, count: usize) {
        self.inner.failures_pending.store(count, Ordering::SeqCst);
    }

    /// Consume one pending injected failure, if any.
    pub(crate) fn take_failure(&self) -> bool {
        self.inner
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
