//! In-process snapshot store.

use super::{SnapshotStore, StoreError, StoredSession};
use crate::session::SessionId;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, instrument};

/// Keeps snapshots in a map. The default store when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: RwLock<HashMap<SessionId, StoredSession>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemoryStore {
    #[instrument(skip(self, snapshot), fields(session_id = %snapshot.id(), version = snapshot.version()))]
    fn save_snapshot(&self, snapshot: &StoredSession) -> Result<(), StoreError> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| StoreError::new("Memory store lock poisoned"))?;
        match snapshots.get(snapshot.id()) {
            Some(existing) if existing.version() > snapshot.version() => {
                debug!(stored = existing.version(), "Newer snapshot already stored");
            }
            _ => {
                snapshots.insert(snapshot.id().clone(), snapshot.clone());
            }
        }
        Ok(())
    }

    fn load_snapshot(&self, id: &str) -> Result<Option<StoredSession>, StoreError> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| StoreError::new("Memory store lock poisoned"))?;
        Ok(snapshots.get(id).cloned())
    }

    fn delete_snapshot(&self, id: &str) -> Result<(), StoreError> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| StoreError::new("Memory store lock poisoned"))?;
        snapshots.remove(id);
        Ok(())
    }
}
