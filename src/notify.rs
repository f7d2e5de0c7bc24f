//! Observers told about finished games.

use crate::db::GameRepository;
use crate::session::{Player, SessionId};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use serde::Serialize;
use strictly_rules::{GameKind, Outcome};
use tracing::{info, instrument};

/// What observers learn about a finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Getters, new)]
pub struct GameSummary {
    session_id: SessionId,
    kind: GameKind,
    white: Option<Player>,
    black: Option<Player>,
    outcome: Outcome,
    plies: usize,
    finished_at: DateTime<Utc>,
}

impl GameSummary {
    /// Player who won, `None` for a draw.
    pub fn winner(&self) -> Option<&Player> {
        match self.outcome.winner()? {
            strictly_rules::Color::White => self.white.as_ref(),
            strictly_rules::Color::Black => self.black.as_ref(),
        }
    }
}

/// Observer failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Notify error: {} at {}:{}", message, file, line)]
pub struct NotifyError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl NotifyError {
    /// Creates a new notify error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Receives terminal transitions. Errors are logged by the caller and never
/// affect the session.
pub trait GameObserver: Send + Sync + std::fmt::Debug {
    /// Called once per finished game, after the result is committed.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the observer could not handle the summary.
    fn game_ended(&self, summary: &GameSummary) -> Result<(), NotifyError>;
}

/// Logs finished games.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl GameObserver for TracingObserver {
    fn game_ended(&self, summary: &GameSummary) -> Result<(), NotifyError> {
        info!(
            session_id = %summary.session_id,
            kind = %summary.kind,
            winner = summary.winner().map(|p| p.id.as_str()).unwrap_or("none"),
            reason = %summary.outcome.reason(),
            points = summary.outcome.points(),
            plies = summary.plies,
            "Game finished"
        );
        Ok(())
    }
}

/// Writes finished games to the `game_results` table.
#[derive(Debug, Clone, new)]
pub struct ResultRecorder {
    repo: GameRepository,
}

impl GameObserver for ResultRecorder {
    #[instrument(skip(self, summary), fields(session_id = %summary.session_id))]
    fn game_ended(&self, summary: &GameSummary) -> Result<(), NotifyError> {
        self.repo
            .record_result(summary)
            .map(|_| ())
            .map_err(|e| NotifyError::new(format!("Failed to record result: {}", e)))
    }
}
