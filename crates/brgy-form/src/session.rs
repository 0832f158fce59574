//! # Session Store
//!
//! File-backed session: the bearer token and the resident identity saved by
//! the login flow, as JSON:
//!
//! ```json
//! { "token": "eyJhbGciOi...", "user": { "name": "Juan Dela Cruz", "barangay": "San Isidro" } }
//! ```
//!
//! The store is the [`IdentitySource`] for every form and the
//! [`TokenSource`] for the HTTP gateway. Every mutation signals identity
//! subscribers. [`SessionStore::watch`] extends that to writes made by other
//! processes or other stores on the same file: the file is watched and each
//! external change is [reloaded](SessionStore::reload).

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use brgy_client::{ApiError, AuthClient};
use brgy_core::{Identity, SessionToken};

use crate::identity::{ChangeNotifier, IdentitySource, IdentitySubscription};

/// Supplies the bearer token for gateway calls.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<SessionToken>;
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to write session file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to read session file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),

    /// The gateway refused the logout; the local session was kept.
    #[error("logout failed: {0}")]
    Logout(#[from] ApiError),

    #[error("failed to watch session file {path}: {source}")]
    Watch { path: PathBuf, source: notify::Error },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<SessionToken>,
    #[serde(default)]
    user: Identity,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct SessionData {
    token: Option<SessionToken>,
    identity: Identity,
}

/// JSON session file plus its in-memory copy.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    data: RwLock<SessionData>,
    changes: ChangeNotifier,
}

impl SessionStore {
    /// Open the session at `path`. A missing file is an empty session.
    ///
    /// A malformed file is treated as empty as well (logged at `warn`), since
    /// a corrupt session must not prevent the forms from rendering.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let data = load(&path)?;
        Ok(Self {
            path,
            data: RwLock::new(data),
            changes: ChangeNotifier::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn identity(&self) -> Identity {
        self.data.read().identity.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.data.read().token.is_some()
    }

    /// Replace token and identity together, as the login flow does.
    pub fn save(&self, token: SessionToken, identity: Identity) -> Result<(), SessionError> {
        self.mutate(|data| {
            data.token = Some(token);
            data.identity = identity;
        })
    }

    pub fn set_identity(&self, identity: Identity) -> Result<(), SessionError> {
        self.mutate(|data| data.identity = identity)
    }

    pub fn set_token(&self, token: SessionToken) -> Result<(), SessionError> {
        self.mutate(|data| data.token = Some(token))
    }

    /// Forget token and identity.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.mutate(|data| *data = SessionData::default())
    }

    /// Re-read the file after an external writer changed it. Subscribers
    /// are signalled only when the session actually differs.
    pub fn reload(&self) -> Result<(), SessionError> {
        {
            // Read under the lock so a concurrent local write is never undone.
            let mut data = self.data.write();
            let fresh = load(&self.path)?;
            if *data == fresh {
                return Ok(());
            }
            *data = fresh;
        }
        self.changes.notify();
        tracing::debug!(path = %self.path.display(), "session reloaded");
        Ok(())
    }

    /// Watch the session file and reload on every external change.
    ///
    /// The containing directory is watched rather than the file, since
    /// writers replace the file by rename. Watching stops when the returned
    /// handle is dropped; the store itself is only held weakly.
    pub fn watch(store: &Arc<Self>) -> Result<SessionWatch, SessionError> {
        let path = store.path.clone();
        let watch_err = |source: notify::Error| SessionError::Watch {
            path: path.clone(),
            source,
        };
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|source| SessionError::Write {
            path: path.clone(),
            source,
        })?;
        let file_name = path.file_name().map(OsString::from).unwrap_or_default();

        let weak: Weak<Self> = Arc::downgrade(store);
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, &file_name) => {
                    let Some(store) = weak.upgrade() else {
                        return;
                    };
                    if let Err(e) = store.reload() {
                        tracing::warn!(path = %store.path.display(), "session reload failed: {e}");
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("session watcher error: {e}"),
            },
            notify::Config::default(),
        )
        .map_err(watch_err)?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(watch_err)?;
        tracing::debug!(path = %path.display(), "watching session file");
        Ok(SessionWatch { _watcher: watcher })
    }

    /// End the session at the gateway, then clear it locally.
    ///
    /// The local session is only cleared once the gateway confirmed.
    pub async fn logout(&self, auth: &AuthClient) -> Result<(), SessionError> {
        let token = self.token();
        auth.logout(token.as_ref()).await?;
        self.clear()?;
        tracing::info!("session cleared after logout");
        Ok(())
    }

    /// Number of live identity subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.changes.subscriber_count()
    }

    fn mutate(&self, apply: impl FnOnce(&mut SessionData)) -> Result<(), SessionError> {
        {
            let mut data = self.data.write();
            apply(&mut data);
            let file = SessionFile {
                token: data.token.clone(),
                user: data.identity.clone(),
            };
            persist(&self.path, &file)?;
        }
        self.changes.notify();
        Ok(())
    }
}

/// Keeps a [`SessionStore`] in sync with its file while alive.
pub struct SessionWatch {
    _watcher: RecommendedWatcher,
}

impl std::fmt::Debug for SessionWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWatch").finish_non_exhaustive()
    }
}

fn touches(event: &Event, file_name: &OsString) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

impl IdentitySource for SessionStore {
    fn read(&self) -> Identity {
        self.identity()
    }

    fn subscribe(&self) -> IdentitySubscription {
        self.changes.subscribe()
    }
}

impl TokenSource for SessionStore {
    fn token(&self) -> Option<SessionToken> {
        self.data.read().token.clone()
    }
}

fn load(path: &Path) -> Result<SessionData, SessionError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SessionData::default()),
        Err(source) => {
            return Err(SessionError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    match serde_json::from_str::<SessionFile>(&raw) {
        Ok(file) => Ok(SessionData {
            token: file.token,
            identity: file.user,
        }),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring malformed session file: {e}");
            Ok(SessionData::default())
        }
    }
}

/// Write via a sibling temp file and rename, so readers never see a
/// half-written session.
fn persist(path: &Path, file: &SessionFile) -> Result<(), SessionError> {
    let json = serde_json::to_vec_pretty(file)?;
    let write_err = |source: io::Error| SessionError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}
