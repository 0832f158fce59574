//! # State-Change Sink and Request Draft
//!
//! A controller reports its full [`FormState`] to a [`StateSink`] after every
//! change, so the surrounding page can keep an aggregate view of what the
//! resident has entered. [`RequestDraft`] is that aggregate: the latest state
//! per document kind.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use brgy_core::{DocumentKind, FormState};

/// Receives the full state of a form after every change.
pub trait StateSink: Send + Sync {
    fn state_changed(&self, kind: DocumentKind, state: &FormState);
}

impl<F> StateSink for F
where
    F: Fn(DocumentKind, &FormState) + Send + Sync,
{
    fn state_changed(&self, kind: DocumentKind, state: &FormState) {
        self(kind, state)
    }
}

/// Latest state of every form the resident has touched.
#[derive(Debug, Default)]
pub struct RequestDraft {
    drafts: Mutex<BTreeMap<DocumentKind, FormState>>,
}

impl RequestDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: DocumentKind) -> Option<FormState> {
        self.drafts.lock().get(&kind).cloned()
    }

    /// Kinds with a non-empty draft, in display order.
    pub fn kinds(&self) -> Vec<DocumentKind> {
        self.drafts.lock().keys().copied().collect()
    }

    pub fn discard(&self, kind: DocumentKind) -> Option<FormState> {
        self.drafts.lock().remove(&kind)
    }

    pub fn snapshot(&self) -> BTreeMap<DocumentKind, FormState> {
        self.drafts.lock().clone()
    }
}

impl StateSink for RequestDraft {
    fn state_changed(&self, kind: DocumentKind, state: &FormState) {
        let mut drafts = self.drafts.lock();
        if state.is_empty() {
            drafts.remove(&kind);
        } else {
            drafts.insert(kind, state.clone());
        }
    }
}
