//! Database models and domain conversions.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use std::str::FromStr;
use strictly_rules::{Color, GameKind};
use tracing::instrument;

use crate::db::schema;
use crate::notify::GameSummary;
use crate::session::SessionStatus;
use crate::store::{StoreError, StoredSession};

/// Session snapshot row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters)]
#[diesel(table_name = schema::session_snapshots)]
pub struct SnapshotRow {
    id: String,
    game_kind: String,
    status: String,
    version: i64,
    record: String,
    updated_at: NaiveDateTime,
}

impl SnapshotRow {
    /// Converts a stored session to its row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the version does not fit the column.
    pub fn from_stored(stored: &StoredSession) -> Result<Self, StoreError> {
        Ok(Self {
            id: stored.id().clone(),
            game_kind: stored.kind().to_string(),
            status: stored.status().to_string(),
            version: i64::try_from(*stored.version())
                .map_err(|_| StoreError::new("Session version out of range"))?,
            record: stored.record().clone(),
            updated_at: stored.updated_at().naive_utc(),
        })
    }

    /// Converts the row back to a stored session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a column holds an unknown value.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn into_stored(self) -> Result<StoredSession, StoreError> {
        let kind = GameKind::from_str(&self.game_kind)
            .map_err(|_| StoreError::new(format!("Invalid game kind: '{}'", self.game_kind)))?;
        let status = SessionStatus::from_str(&self.status)
            .map_err(|_| StoreError::new(format!("Invalid status: '{}'", self.status)))?;
        let version = u64::try_from(self.version)
            .map_err(|_| StoreError::new(format!("Invalid version: {}", self.version)))?;
        Ok(StoredSession::new(
            self.id,
            kind,
            status,
            version,
            self.record,
            self.updated_at.and_utc(),
        ))
    }
}

/// Finished game row.
#[derive(Debug, Clone, Queryable, Selectable, Getters)]
#[diesel(table_name = schema::game_results)]
pub struct GameResult {
    id: i32,
    session_id: String,
    game_kind: String,
    white_id: Option<String>,
    black_id: Option<String>,
    winner: Option<String>,
    reason: String,
    points: i32,
    plies: i32,
    finished_at: NaiveDateTime,
}

/// Result of a game from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOutcome {
    /// The player won.
    Win,
    /// The player lost.
    Loss,
    /// No winner.
    Draw,
}

impl GameResult {
    /// Seat `player_id` held in this game.
    pub fn seat_of(&self, player_id: &str) -> Option<Color> {
        if self.white_id.as_deref() == Some(player_id) {
            Some(Color::White)
        } else if self.black_id.as_deref() == Some(player_id) {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// The game's result for `player_id`, `None` if they did not play.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the winner column is not a color.
    pub fn outcome_for(&self, player_id: &str) -> Result<Option<GameOutcome>, StoreError> {
        let Some(seat) = self.seat_of(player_id) else {
            return Ok(None);
        };
        let outcome = match self.winner.as_deref() {
            None => GameOutcome::Draw,
            Some(text) => {
                let winner = Color::from_str(text)
                    .map_err(|_| StoreError::new(format!("Invalid winner: '{}'", text)))?;
                if winner == seat {
                    GameOutcome::Win
                } else {
                    GameOutcome::Loss
                }
            }
        };
        Ok(Some(outcome))
    }
}

/// Insertable finished game.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::game_results)]
pub struct NewGameResult {
    session_id: String,
    game_kind: String,
    white_id: Option<String>,
    black_id: Option<String>,
    winner: Option<String>,
    reason: String,
    points: i32,
    plies: i32,
    finished_at: NaiveDateTime,
}

impl NewGameResult {
    /// Row for a finished game.
    pub fn from_summary(summary: &GameSummary) -> Self {
        let outcome = summary.outcome();
        Self::new(
            summary.session_id().clone(),
            summary.kind().to_string(),
            summary.white().as_ref().map(|p| p.id.clone()),
            summary.black().as_ref().map(|p| p.id.clone()),
            outcome.winner().map(|c| c.to_string()),
            outcome.reason().to_string(),
            i32::try_from(outcome.points()).unwrap_or(i32::MAX),
            i32::try_from(*summary.plies()).unwrap_or(i32::MAX),
            summary.finished_at().naive_utc(),
        )
    }
}

/// A player's record over all finished games.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct PlayerRecord {
    games: i32,
    wins: i32,
    losses: i32,
    draws: i32,
    points_won: i32,
    points_lost: i32,
}

impl PlayerRecord {
    /// Adds one game to the record.
    pub fn add(&mut self, outcome: GameOutcome, points: i32) {
        self.games += 1;
        match outcome {
            GameOutcome::Win => {
                self.wins += 1;
                self.points_won += points;
            }
            GameOutcome::Loss => {
                self.losses += 1;
                self.points_lost += points;
            }
            GameOutcome::Draw => self.draws += 1,
        }
    }

    /// Win rate as a percentage (0.0 to 100.0).
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            (self.wins as f64 / self.games as f64) * 100.0
        }
    }
}
