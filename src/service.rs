//! Game service: the inbound API over the session registry.
//!
//! Every mutation runs under the session's lock. After the commit the new
//! record is written to the [`SnapshotStore`] and, if the game just ended,
//! observers are notified. Storage failures never roll a commit back; they
//! are reported on the [`Receipt`] as [`Durability::Degraded`].

use crate::error::SessionError;
use crate::notify::{GameObserver, GameSummary, TracingObserver};
use crate::session::{
    Player, SessionCell, SessionEntry, SessionId, SessionOps, SessionRegistry, SessionSnapshot,
    SessionStatus, new_session, restore_session,
};
use crate::store::{MemoryStore, SnapshotStore, StoredSession};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_setters::Setters;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use strictly_rules::{Color, GameKind, Outcome};
use tracing::{debug, info, instrument, warn};

/// Tunables of a [`GameService`].
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct ServiceConfig {
    /// Time the side to move has before losing on time. `None` disables
    /// turn timers.
    turn_timeout: Option<Duration>,
    /// Sessions unchanged for this long are swept.
    idle_timeout: Duration,
    /// Seed for session ids and dice. `None` seeds from the OS.
    seed: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            turn_timeout: None,
            idle_timeout: Duration::from_secs(60 * 60),
            seed: None,
        }
    }
}

/// Whether a committed change reached the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    /// The change was written.
    Persisted,
    /// The change is live in memory only.
    Degraded(String),
}

impl Durability {
    /// Returns true if the change was written.
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }
}

/// Result of a committed operation.
#[derive(Debug, Clone, Getters)]
pub struct Receipt<T> {
    /// Value returned by the operation.
    value: T,
    /// Snapshot published by the commit.
    snapshot: Arc<SessionSnapshot>,
    /// Whether the commit was persisted.
    durability: Durability,
}

impl<T> Receipt<T> {
    /// Consumes the receipt, returning the operation's value.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Work left after a commit, done outside the session lock.
#[derive(Debug, Default)]
struct Aftermath {
    stored: Option<Result<StoredSession, String>>,
    ended: Option<GameSummary>,
}

#[derive(Debug)]
struct ServiceInner {
    registry: SessionRegistry,
    store: Arc<dyn SnapshotStore>,
    observers: Vec<Arc<dyn GameObserver>>,
    config: ServiceConfig,
    seeds: Mutex<ChaCha8Rng>,
}

/// Cheaply cloneable handle to the game service.
#[derive(Debug, Clone)]
pub struct GameService {
    inner: Arc<ServiceInner>,
}

impl GameService {
    /// Creates a service over `store`, notifying `observers` of finished
    /// games.
    #[instrument(skip(store, observers), fields(observers = observers.len()))]
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn SnapshotStore>,
        observers: Vec<Arc<dyn GameObserver>>,
    ) -> Self {
        let seeds = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        info!(?config, "Creating game service");
        Self {
            inner: Arc::new(ServiceInner {
                registry: SessionRegistry::new(),
                store,
                observers,
                config,
                seeds: Mutex::new(seeds),
            }),
        }
    }

    /// Service backed by a [`MemoryStore`] that logs finished games.
    pub fn in_memory(config: ServiceConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryStore::new()),
            vec![Arc::new(TracingObserver)],
        )
    }

    /// Service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Number of sessions loaded in memory.
    pub fn session_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Creates a session with `creator` seated as White.
    ///
    /// A random id is assigned when `id` is `None`.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionExists`] if the id is loaded or stored.
    #[instrument(skip(self, creator), fields(player_id = %creator.id))]
    pub fn create_session(
        &self,
        kind: GameKind,
        creator: Player,
        id: Option<SessionId>,
    ) -> Result<Receipt<SessionId>, SessionError> {
        let id = match id {
            Some(id) => id,
            None => format!("{:016x}", self.next_seed()?),
        };
        match self.inner.store.load_snapshot(&id) {
            Ok(Some(_)) => {
                warn!(session_id = %id, "Session id already stored");
                return Err(SessionError::SessionExists(id));
            }
            Ok(None) => {}
            Err(e) => warn!(session_id = %id, error = %e, "Could not check store for id"),
        }

        let session = new_session(kind, id.clone(), creator);
        let stored = stored_session(session.as_ref());
        let rng = ChaCha8Rng::seed_from_u64(self.next_seed()?);
        let entry = self.inner.registry.insert(SessionEntry::new(session, rng))?;
        let snapshot = entry.snapshot()?;
        let durability = self.persist(Some(stored));
        info!(session_id = %id, %kind, "Session created");
        Ok(Receipt {
            value: id,
            snapshot,
            durability,
        })
    }

    /// Seats `player` in session `id`.
    ///
    /// # Errors
    ///
    /// See [`GameSession::join`](crate::session::GameSession::join).
    #[instrument(skip(self, player), fields(player_id = %player.id))]
    pub fn join_session(&self, id: &str, player: Player) -> Result<Receipt<Color>, SessionError> {
        self.commit(id, |cell| cell.session.join(player, &mut cell.rng))
    }

    /// Latest snapshot of session `id`. Never waits for a move in flight.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionNotFound`] if the id is neither loaded nor
    /// stored.
    pub fn get_state(&self, id: &str) -> Result<Arc<SessionSnapshot>, SessionError> {
        self.lookup(id)?.snapshot()
    }

    /// Submits a JSON-encoded move.
    ///
    /// # Errors
    ///
    /// See [`GameSession::submit`](crate::session::GameSession::submit).
    #[instrument(skip(self, mv))]
    pub fn submit_move(
        &self,
        id: &str,
        player_id: &str,
        mv: serde_json::Value,
    ) -> Result<Receipt<()>, SessionError> {
        self.commit(id, |cell| cell.session.submit(player_id, mv, &mut cell.rng))
    }

    /// Resigns on behalf of `player_id`.
    ///
    /// # Errors
    ///
    /// See [`GameSession::resign`](crate::session::GameSession::resign).
    #[instrument(skip(self))]
    pub fn resign(&self, id: &str, player_id: &str) -> Result<Receipt<Outcome>, SessionError> {
        self.commit(id, |cell| cell.session.resign(player_id))
    }

    /// Votes for a rematch. The value is true once the rematch started.
    ///
    /// # Errors
    ///
    /// See [`GameSession::request_rematch`](crate::session::GameSession::request_rematch).
    #[instrument(skip(self))]
    pub fn request_rematch(&self, id: &str, player_id: &str) -> Result<Receipt<bool>, SessionError> {
        self.commit(id, |cell| cell.session.request_rematch(player_id, &mut cell.rng))
    }

    /// Removes `player_id` from the session. Once every player has left the
    /// session is dropped from memory and from the store; the value is true
    /// in that case.
    ///
    /// # Errors
    ///
    /// See [`GameSession::leave`](crate::session::GameSession::leave).
    #[instrument(skip(self))]
    pub fn leave(&self, id: &str, player_id: &str) -> Result<Receipt<bool>, SessionError> {
        let receipt = self.commit(id, |cell| cell.session.leave(player_id))?;
        if !receipt.value {
            return Ok(receipt);
        }
        self.inner.registry.remove(id)?;
        let durability = match self.inner.store.delete_snapshot(id) {
            Ok(()) => Durability::Persisted,
            Err(e) => {
                warn!(session_id = id, error = %e, "Failed to delete deserted session");
                Durability::Degraded(e.to_string())
            }
        };
        info!(session_id = id, "Deserted session removed");
        Ok(Receipt {
            durability,
            ..receipt
        })
    }

    /// Ends session `id` with no winner.
    ///
    /// # Errors
    ///
    /// See [`GameSession::abandon`](crate::session::GameSession::abandon).
    #[instrument(skip(self))]
    pub fn abandon(&self, id: &str) -> Result<Receipt<Outcome>, SessionError> {
        self.commit(id, |cell| cell.session.abandon())
    }

    /// Ends the game on time if session `id` is still at `version`.
    ///
    /// # Errors
    ///
    /// See [`GameSession::expire_turn`](crate::session::GameSession::expire_turn).
    #[instrument(skip(self))]
    pub fn expire_turn(&self, id: &str, version: u64) -> Result<Receipt<Outcome>, SessionError> {
        self.commit(id, |cell| cell.session.expire_turn(version))
    }

    /// Loads session `id` from the store into memory, replaying its
    /// history. A session already in memory is returned as is.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionNotFound`] if nothing is stored under `id`,
    /// [`SessionError::InvariantViolation`] if the store fails or the record
    /// does not replay.
    #[instrument(skip(self))]
    pub fn resume(&self, id: &str) -> Result<Arc<SessionSnapshot>, SessionError> {
        if let Ok(entry) = self.inner.registry.get(id) {
            return entry.snapshot();
        }
        let stored = self
            .inner
            .store
            .load_snapshot(id)
            .map_err(|e| SessionError::InvariantViolation(format!("Store unavailable: {}", e)))?
            .ok_or_else(|| SessionError::SessionNotFound(id.to_string()))?;

        let session = restore_session(*stored.kind(), stored.record())?;
        if session.id() != id {
            return Err(SessionError::InvariantViolation(format!(
                "Stored record for {} belongs to {}",
                id,
                session.id()
            )));
        }
        let in_progress = session.status() == SessionStatus::InProgress;
        let version = session.version();
        let rng = ChaCha8Rng::seed_from_u64(self.next_seed()?);
        let entry = match self.inner.registry.insert(SessionEntry::new(session, rng)) {
            Ok(entry) => entry,
            Err(SessionError::SessionExists(_)) => {
                debug!("Session resumed concurrently");
                return self.inner.registry.get(id)?.snapshot();
            }
            Err(e) => return Err(e),
        };
        if in_progress {
            self.arm_timer(&entry, version);
        }
        info!(version, "Session resumed from store");
        entry.snapshot()
    }

    /// Snapshots of every loaded session, oldest first.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvariantViolation`] if a lock is poisoned.
    pub fn list_sessions(&self) -> Result<Vec<Arc<SessionSnapshot>>, SessionError> {
        self.inner.registry.list()
    }

    /// Abandons sessions idle for longer than the idle timeout and unloads
    /// them. Returns the swept ids.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvariantViolation`] if the registry lock is
    /// poisoned. Failures on single sessions are logged and skipped.
    #[instrument(skip(self))]
    pub fn sweep_idle(&self, now: DateTime<Utc>) -> Result<Vec<SessionId>, SessionError> {
        let idle = chrono::Duration::from_std(self.inner.config.idle_timeout)
            .ok()
            .and_then(|timeout| now.checked_sub_signed(timeout));
        let Some(cutoff) = idle else {
            return Ok(Vec::new());
        };

        let idle = self.inner.registry.idle_since(cutoff)?;
        let swept = self.sweep_ids(idle, cutoff)?;
        if !swept.is_empty() {
            info!(count = swept.len(), "Swept idle sessions");
        }
        Ok(swept)
    }

    /// Sweeps the listed sessions that are still unchanged since `cutoff`.
    ///
    /// Idleness is checked again under each session lock, so a session
    /// touched after it was listed is neither abandoned nor unloaded.
    fn sweep_ids(&self, ids: Vec<SessionId>, cutoff: DateTime<Utc>) -> Result<Vec<SessionId>, SessionError> {
        let mut swept = Vec::new();
        for id in ids {
            let result = self.commit(&id, |cell| {
                if cell.session.updated_at() >= cutoff {
                    return Ok(false);
                }
                if cell.session.status() == SessionStatus::InProgress {
                    cell.session.abandon()?;
                }
                Ok(true)
            });
            let version = match result {
                Ok(receipt) if receipt.value => *receipt.snapshot.version(),
                Ok(_) => {
                    debug!(session_id = %id, "Session active again, not swept");
                    continue;
                }
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Could not sweep idle session");
                    continue;
                }
            };
            if self.inner.registry.remove_unchanged(&id, version)? {
                swept.push(id);
            } else {
                debug!(session_id = %id, "Session changed while being swept");
            }
        }
        Ok(swept)
    }

    /// Session `id` from memory, resuming it from the store if needed.
    fn lookup(&self, id: &str) -> Result<Arc<SessionEntry>, SessionError> {
        match self.inner.registry.get(id) {
            Err(SessionError::SessionNotFound(_)) => {
                self.resume(id)?;
                self.inner.registry.get(id)
            }
            other => other,
        }
    }

    /// Runs `op` on session `id`, then persists, re-arms the timer and
    /// notifies observers as the change requires.
    fn commit<T>(
        &self,
        id: &str,
        op: impl FnOnce(&mut SessionCell) -> Result<T, SessionError>,
    ) -> Result<Receipt<T>, SessionError> {
        let entry = self.lookup(id)?;
        let mut aftermath = Aftermath::default();
        let result = entry.mutate(|cell| {
            let status = cell.session.status();
            let version = cell.session.version();
            let result = op(&mut *cell);

            let session = cell.session.as_ref();
            if session.version() != version {
                aftermath.stored = Some(stored_session(session));
                if status != SessionStatus::Ended && session.status() == SessionStatus::Ended {
                    aftermath.ended = session.summary();
                }
                if session.status() == SessionStatus::InProgress {
                    self.arm_timer(&entry, session.version());
                } else {
                    entry.timer().cancel();
                }
            }
            result
        });

        let durability = self.persist(aftermath.stored);
        if let Some(summary) = &aftermath.ended {
            self.notify(summary);
        }
        let (value, snapshot) = result?;
        Ok(Receipt {
            value,
            snapshot,
            durability,
        })
    }

    fn persist(&self, stored: Option<Result<StoredSession, String>>) -> Durability {
        let result = match stored {
            None => return Durability::Persisted,
            Some(Ok(stored)) => self
                .inner
                .store
                .save_snapshot(&stored)
                .map_err(|e| e.to_string()),
            Some(Err(e)) => Err(e),
        };
        match result {
            Ok(()) => Durability::Persisted,
            Err(message) => {
                warn!(error = %message, "Session change not persisted");
                Durability::Degraded(message)
            }
        }
    }

    fn notify(&self, summary: &GameSummary) {
        for observer in &self.inner.observers {
            if let Err(e) = observer.game_ended(summary) {
                warn!(session_id = %summary.session_id(), ?observer, error = %e, "Observer failed");
            }
        }
    }

    fn arm_timer(&self, entry: &SessionEntry, version: u64) {
        let Some(timeout) = self.inner.config.turn_timeout else {
            return;
        };
        let service: Weak<ServiceInner> = Arc::downgrade(&self.inner);
        let id = entry.id().to_string();
        let armed = entry.timer().arm(timeout, move || {
            let Some(inner) = service.upgrade() else {
                return;
            };
            match (GameService { inner }).expire_turn(&id, version) {
                Ok(receipt) => info!(session_id = %id, outcome = ?receipt.value, "Turn timed out"),
                Err(e) => debug!(session_id = %id, error = %e, "Turn timer ignored"),
            }
        });
        if armed {
            debug!(session_id = %entry.id(), version, ?timeout, "Turn timer armed");
        }
    }

    fn next_seed(&self) -> Result<u64, SessionError> {
        let mut seeds = self
            .inner
            .seeds
            .lock()
            .map_err(|_| SessionError::InvariantViolation("Seed lock poisoned".to_string()))?;
        Ok(seeds.next_u64())
    }
}

fn stored_session(session: &dyn SessionOps) -> Result<StoredSession, String> {
    let record = session.record_json().map_err(|e| e.to_string())?;
    Ok(StoredSession::new(
        session.id().to_string(),
        session.kind(),
        session.status(),
        session.version(),
        record,
        session.updated_at(),
    ))
}
