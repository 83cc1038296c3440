use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Opaque connection identity. One per WebSocket connection, minted at
/// accept time and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Process-wide map from connection identity to that session's current
/// directory. Entries are created on connect and removed on disconnect;
/// only the owning connection's handler ever mutates its entry.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<SessionId, PathBuf>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, id: SessionId, root: PathBuf) {
        self.inner.write().insert(id, root);
    }

    /// `None` means the connection lifecycle was violated; callers must treat
    /// it as fatal for that session rather than defaulting the directory.
    pub fn current_dir(&self, id: SessionId) -> Option<PathBuf> {
        self.inner.read().get(&id).cloned()
    }

    pub fn set_current_dir(&self, id: SessionId, dir: PathBuf) {
        if let Some(entry) = self.inner.write().get_mut(&id) {
            *entry = dir;
        }
    }

    pub fn destroy(&self, id: SessionId) {
        self.inner.write().remove(&id);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
