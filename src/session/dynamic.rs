//! Type-erased sessions so one registry can hold every game.

use super::machine::{GameSession, SessionStatus};
use super::record::{SessionRecord, SessionSnapshot};
use super::{Player, SessionId};
use crate::error::SessionError;
use crate::notify::GameSummary;
use chrono::{DateTime, Utc};
use rand::RngCore;
use strictly_backgammon::Backgammon;
use strictly_chess::Chess;
use strictly_rules::{Color, GameKind, GameRules, Outcome};
use tracing::warn;

/// Object-safe session operations. Moves and records travel as JSON.
pub trait SessionOps: Send + Sync + std::fmt::Debug {
    /// Session id.
    fn id(&self) -> &str;
    /// Game the session runs.
    fn kind(&self) -> GameKind;
    /// Lifecycle state.
    fn status(&self) -> SessionStatus;
    /// Version counter.
    fn version(&self) -> u64;
    /// Time of the last change.
    fn updated_at(&self) -> DateTime<Utc>;
    /// See [`GameSession::join`].
    fn join(&mut self, player: Player, rng: &mut dyn RngCore) -> Result<Color, SessionError>;
    /// Decodes `mv` and submits it. See [`GameSession::submit`].
    fn submit(
        &mut self,
        player_id: &str,
        mv: serde_json::Value,
        rng: &mut dyn RngCore,
    ) -> Result<(), SessionError>;
    /// See [`GameSession::resign`].
    fn resign(&mut self, player_id: &str) -> Result<Outcome, SessionError>;
    /// See [`GameSession::expire_turn`].
    fn expire_turn(&mut self, version: u64) -> Result<Outcome, SessionError>;
    /// See [`GameSession::leave`].
    fn leave(&mut self, player_id: &str) -> Result<bool, SessionError>;
    /// See [`GameSession::abandon`].
    fn abandon(&mut self) -> Result<Outcome, SessionError>;
    /// See [`GameSession::request_rematch`].
    fn request_rematch(&mut self, player_id: &str, rng: &mut dyn RngCore) -> Result<bool, SessionError>;
    /// Read snapshot of the current version.
    fn snapshot(&self) -> SessionSnapshot;
    /// The session record as JSON.
    fn record_json(&self) -> Result<String, SessionError>;
    /// Summary of the finished game.
    fn summary(&self) -> Option<GameSummary>;
}

impl<R: GameRules> SessionOps for GameSession<R> {
    fn id(&self) -> &str {
        GameSession::id(self)
    }

    fn kind(&self) -> GameKind {
        R::KIND
    }

    fn status(&self) -> SessionStatus {
        GameSession::status(self)
    }

    fn version(&self) -> u64 {
        GameSession::version(self)
    }

    fn updated_at(&self) -> DateTime<Utc> {
        GameSession::updated_at(self)
    }

    fn join(&mut self, player: Player, rng: &mut dyn RngCore) -> Result<Color, SessionError> {
        GameSession::join(self, player, rng)
    }

    fn submit(
        &mut self,
        player_id: &str,
        mv: serde_json::Value,
        rng: &mut dyn RngCore,
    ) -> Result<(), SessionError> {
        let mv: R::Move = serde_json::from_value(mv).map_err(|e| {
            warn!(session_id = %GameSession::id(self), error = %e, "Malformed move");
            SessionError::IllegalMove(format!("Malformed {} move: {}", R::KIND, e))
        })?;
        GameSession::submit(self, player_id, mv, rng)
    }

    fn resign(&mut self, player_id: &str) -> Result<Outcome, SessionError> {
        GameSession::resign(self, player_id)
    }

    fn expire_turn(&mut self, version: u64) -> Result<Outcome, SessionError> {
        GameSession::expire_turn(self, version)
    }

    fn leave(&mut self, player_id: &str) -> Result<bool, SessionError> {
        GameSession::leave(self, player_id)
    }

    fn abandon(&mut self) -> Result<Outcome, SessionError> {
        GameSession::abandon(self)
    }

    fn request_rematch(&mut self, player_id: &str, rng: &mut dyn RngCore) -> Result<bool, SessionError> {
        GameSession::request_rematch(self, player_id, rng)
    }

    fn snapshot(&self) -> SessionSnapshot {
        GameSession::snapshot(self)
    }

    fn record_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(&self.record())
            .map_err(|e| SessionError::InvariantViolation(format!("Record not serializable: {}", e)))
    }

    fn summary(&self) -> Option<GameSummary> {
        GameSession::summary(self)
    }
}

/// Creates a session of `kind` with `creator` seated as White.
pub fn new_session(kind: GameKind, id: SessionId, creator: Player) -> Box<dyn SessionOps> {
    match kind {
        GameKind::Chess => Box::new(GameSession::create(id, Chess, creator)),
        GameKind::Backgammon => Box::new(GameSession::create(id, Backgammon, creator)),
    }
}

/// Rebuilds a session of `kind` from its JSON record.
///
/// # Errors
///
/// [`SessionError::InvariantViolation`] if the record cannot be parsed or
/// fails replay.
pub fn restore_session(kind: GameKind, record: &str) -> Result<Box<dyn SessionOps>, SessionError> {
    match kind {
        GameKind::Chess => Ok(Box::new(restore_as(Chess, record)?)),
        GameKind::Backgammon => Ok(Box::new(restore_as(Backgammon, record)?)),
    }
}

fn restore_as<R: GameRules>(rules: R, record: &str) -> Result<GameSession<R>, SessionError> {
    let record: SessionRecord<R> = serde_json::from_str(record)
        .map_err(|e| SessionError::InvariantViolation(format!("Unreadable {} record: {}", R::KIND, e)))?;
    GameSession::restore(rules, record)
}
