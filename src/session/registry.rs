//! Registry of live sessions.
//!
//! The map sits behind an `RwLock`; each entry guards its session with its
//! own `Mutex` so sessions never block each other. Readers use the snapshot
//! published at the end of the last mutation and never wait for a move to
//! be validated.

use super::dynamic::SessionOps;
use super::record::SessionSnapshot;
use super::SessionId;
use crate::error::SessionError;
use crate::timer::TimerSlot;
use chrono::{DateTime, Utc};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

fn poisoned(what: &str) -> SessionError {
    error!(lock = what, "Lock poisoned");
    SessionError::InvariantViolation(format!("{} lock poisoned", what))
}

/// A session together with the random source that draws its chances.
#[derive(Debug)]
pub struct SessionCell {
    /// The session.
    pub session: Box<dyn SessionOps>,
    /// Per-session RNG.
    pub rng: ChaCha8Rng,
}

/// One registered session.
#[derive(Debug)]
pub struct SessionEntry {
    id: SessionId,
    cell: Mutex<SessionCell>,
    published: RwLock<Arc<SessionSnapshot>>,
    timer: TimerSlot,
}

impl SessionEntry {
    /// Wraps a session and publishes its first snapshot.
    pub fn new(session: Box<dyn SessionOps>, rng: ChaCha8Rng) -> Self {
        let snapshot = Arc::new(session.snapshot());
        Self {
            id: session.id().to_string(),
            cell: Mutex::new(SessionCell { session, rng }),
            published: RwLock::new(snapshot),
            timer: TimerSlot::default(),
        }
    }

    /// Session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The turn timer slot of this session.
    pub fn timer(&self) -> &TimerSlot {
        &self.timer
    }

    /// Latest published snapshot.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvariantViolation`] if the snapshot lock is poisoned.
    pub fn snapshot(&self) -> Result<Arc<SessionSnapshot>, SessionError> {
        self.published
            .read()
            .map(|snapshot| Arc::clone(&snapshot))
            .map_err(|_| poisoned("snapshot"))
    }

    /// Runs `op` under the session lock and publishes a new snapshot if the
    /// session changed.
    ///
    /// Returns the operation's value and the snapshot current when the lock
    /// was released.
    ///
    /// # Errors
    ///
    /// The operation's error, or [`SessionError::InvariantViolation`] for a
    /// poisoned lock.
    #[instrument(skip(self, op), fields(session_id = %self.id))]
    pub fn mutate<T>(
        &self,
        op: impl FnOnce(&mut SessionCell) -> Result<T, SessionError>,
    ) -> Result<(T, Arc<SessionSnapshot>), SessionError> {
        let mut cell = self.cell.lock().map_err(|_| poisoned("session"))?;
        let before = cell.session.version();
        let result = op(&mut cell);

        let snapshot = if cell.session.version() != before {
            let fresh = Arc::new(cell.session.snapshot());
            let mut published = self.published.write().map_err(|_| poisoned("snapshot"))?;
            *published = Arc::clone(&fresh);
            debug!(version = fresh.version(), "Published snapshot");
            fresh
        } else {
            self.snapshot()?
        };
        drop(cell);

        result.map(|value| (value, snapshot))
    }
}

/// All sessions loaded in memory.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<SessionEntry>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a session.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionNotFound`] for an unknown id.
    pub fn get(&self, id: &str) -> Result<Arc<SessionEntry>, SessionError> {
        let sessions = self.sessions.read().map_err(|_| poisoned("registry"))?;
        sessions.get(id).cloned().ok_or_else(|| {
            debug!(session_id = id, "Session not found");
            SessionError::SessionNotFound(id.to_string())
        })
    }

    /// Registers a session.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionExists`] if the id is taken.
    #[instrument(skip(self, entry), fields(session_id = %entry.id))]
    pub fn insert(&self, entry: SessionEntry) -> Result<Arc<SessionEntry>, SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned("registry"))?;
        if sessions.contains_key(&entry.id) {
            warn!("Session already exists");
            return Err(SessionError::SessionExists(entry.id));
        }
        let entry = Arc::new(entry);
        sessions.insert(entry.id.clone(), Arc::clone(&entry));
        info!(count = sessions.len(), "Registered session");
        Ok(entry)
    }

    /// Unregisters a session, cancelling its timer.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvariantViolation`] if the registry lock is poisoned.
    #[instrument(skip(self))]
    pub fn remove(&self, id: &str) -> Result<Option<Arc<SessionEntry>>, SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned("registry"))?;
        let removed = sessions.remove(id);
        if let Some(entry) = &removed {
            entry.timer.cancel();
            info!(count = sessions.len(), "Removed session");
        }
        Ok(removed)
    }

    /// Unregisters a session only if it is still at `version`.
    ///
    /// Returns false when the session is gone or has changed since.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvariantViolation`] if a lock is poisoned.
    #[instrument(skip(self))]
    pub fn remove_unchanged(&self, id: &str, version: u64) -> Result<bool, SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned("registry"))?;
        let Some(entry) = sessions.get(id) else {
            return Ok(false);
        };
        let current = entry.cell.lock().map_err(|_| poisoned("session"))?.session.version();
        if current != version {
            debug!(version, current, "Session changed, kept registered");
            return Ok(false);
        }
        if let Some(entry) = sessions.remove(id) {
            entry.timer.cancel();
            info!(count = sessions.len(), "Removed session");
        }
        Ok(true)
    }

    /// Snapshots of every session, oldest first.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvariantViolation`] if a lock is poisoned.
    pub fn list(&self) -> Result<Vec<Arc<SessionSnapshot>>, SessionError> {
        let entries: Vec<Arc<SessionEntry>> = {
            let sessions = self.sessions.read().map_err(|_| poisoned("registry"))?;
            sessions.values().cloned().collect()
        };
        let mut snapshots = entries
            .iter()
            .map(|entry| entry.snapshot())
            .collect::<Result<Vec<_>, _>>()?;
        snapshots.sort_by_key(|s| *s.created_at());
        Ok(snapshots)
    }

    /// Ids of sessions unchanged since before `cutoff`.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvariantViolation`] if a lock is poisoned.
    pub fn idle_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<SessionId>, SessionError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|s| *s.updated_at() < cutoff)
            .map(|s| s.id().clone())
            .collect())
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Returns true if no session is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Player, new_session};
    use rand::SeedableRng;
    use strictly_rules::GameKind;

    fn entry(id: &str) -> SessionEntry {
        SessionEntry::new(
            new_session(GameKind::Chess, id.to_string(), Player::human("alice")),
            ChaCha8Rng::seed_from_u64(0),
        )
    }

    #[test]
    fn test_insert_get_remove() {
        let registry = SessionRegistry::new();
        registry.insert(entry("a")).unwrap();
        assert!(matches!(
            registry.insert(entry("a")),
            Err(SessionError::SessionExists(_))
        ));
        assert_eq!(registry.get("a").unwrap().id(), "a");
        assert!(registry.remove("a").unwrap().is_some());
        assert!(registry.remove("a").unwrap().is_none());
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get("a"),
            Err(SessionError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_failed_mutation_keeps_snapshot() {
        let entry = entry("a");
        let before = entry.snapshot().unwrap();
        let err = entry
            .mutate(|cell| cell.session.resign("alice"))
            .unwrap_err();
        assert!(matches!(err, SessionError::NotStarted(_)));
        assert!(Arc::ptr_eq(&before, &entry.snapshot().unwrap()));

        let (color, snapshot) = entry
            .mutate(|cell| cell.session.join(Player::human("bob"), &mut cell.rng))
            .unwrap();
        assert_eq!(color, strictly_rules::Color::Black);
        assert_eq!(snapshot.version(), &1);
        assert!(Arc::ptr_eq(&snapshot, &entry.snapshot().unwrap()));
    }

    #[test]
    fn test_idle_since() {
        let registry = SessionRegistry::new();
        registry.insert(entry("a")).unwrap();
        let future = Utc::now() + chrono::Duration::minutes(1);
        assert_eq!(registry.idle_since(future).unwrap(), vec!["a".to_string()]);
        let past = Utc::now() - chrono::Duration::minutes(1);
        assert!(registry.idle_since(past).unwrap().is_empty());
    }
}
