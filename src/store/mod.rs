//! Durable session snapshots.
//!
//! The service writes a [`StoredSession`] after every committed transition
//! and reads it back to resume a session after a restart.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use crate::session::{SessionId, SessionStatus};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use strictly_rules::GameKind;

/// A session record as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct StoredSession {
    id: SessionId,
    kind: GameKind,
    status: SessionStatus,
    version: u64,
    /// JSON-encoded session record.
    record: String,
    updated_at: DateTime<Utc>,
}

/// Persistence boundary for session snapshots.
///
/// Implementations keep at most one snapshot per id and never replace a
/// snapshot with one of a lower version.
pub trait SnapshotStore: Send + Sync + std::fmt::Debug {
    /// Saves `snapshot`, replacing an older version of the same session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn save_snapshot(&self, snapshot: &StoredSession) -> Result<(), StoreError>;

    /// Loads the latest snapshot of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn load_snapshot(&self, id: &str) -> Result<Option<StoredSession>, StoreError>;

    /// Deletes the snapshot of `id`. Deleting a missing id is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    fn delete_snapshot(&self, id: &str) -> Result<(), StoreError>;
}
