//! # Identity Source
//!
//! Controllers read the resident identity synchronously and learn about
//! changes through a scoped [`IdentitySubscription`]. A change signal
//! carries no data; the subscriber re-reads the source.

use parking_lot::RwLock;
use tokio::sync::watch;

use brgy_core::Identity;

/// Read-only access to the persisted identity, shared by every form.
pub trait IdentitySource: Send + Sync {
    /// Current identity. Absent or unreadable storage reads as empty.
    fn read(&self) -> Identity;

    /// Register for change signals. Dropping the handle deregisters it.
    fn subscribe(&self) -> IdentitySubscription;
}

/// One registration for identity change signals.
///
/// Wraps a `watch` receiver over a generation counter: every store mutation
/// bumps the counter. The handle owns the registration, so it is released on
/// every exit path, including controller teardown.
#[derive(Debug)]
pub struct IdentitySubscription {
    rx: watch::Receiver<u64>,
}

impl IdentitySubscription {
    pub fn new(rx: watch::Receiver<u64>) -> Self {
        Self { rx }
    }

    /// Whether a change was signalled since the last [`mark_seen`](Self::mark_seen).
    /// A closed source reports no change.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Acknowledge all signals received so far.
    pub fn mark_seen(&mut self) {
        self.rx.borrow_and_update();
    }

    /// Wait for the next change signal. Returns `false` once the source is
    /// gone and no further signals can arrive.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// Generation counter shared by identity sources.
#[derive(Debug)]
pub(crate) struct ChangeNotifier {
    tx: watch::Sender<u64>,
}

impl ChangeNotifier {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> IdentitySubscription {
        IdentitySubscription::new(self.tx.subscribe())
    }

    pub(crate) fn notify(&self) {
        self.tx.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// In-memory identity source, for embedding callers that keep the identity
/// elsewhere.
#[derive(Debug)]
pub struct MemoryIdentity {
    identity: RwLock<Identity>,
    changes: ChangeNotifier,
}

impl MemoryIdentity {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity: RwLock::new(identity),
            changes: ChangeNotifier::new(),
        }
    }

    /// Replace the identity and signal subscribers.
    pub fn set(&self, identity: Identity) {
        *self.identity.write() = identity;
        self.changes.notify();
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.changes.subscriber_count()
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new(Identity::default())
    }
}

impl IdentitySource for MemoryIdentity {
    fn read(&self) -> Identity {
        self.identity.read().clone()
    }

    fn subscribe(&self) -> IdentitySubscription {
        self.changes.subscribe()
    }
}
