//! Serialized forms of a session: the durable record and the read snapshot.

use super::machine::{Ply, SessionStatus};
use super::{Player, SessionId};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use strictly_rules::{Color, GameKind, GameRules, Outcome};

/// Everything needed to rebuild a session after a restart.
///
/// The history is replayed on restore; `board` is the board the session
/// held when the record was taken and must match the replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SessionRecord<R: GameRules> {
    /// Session id.
    pub id: SessionId,
    /// Game the record belongs to.
    pub kind: GameKind,
    /// White seat.
    pub white: Option<Player>,
    /// Black seat.
    pub black: Option<Player>,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// Chance drawn when the game started.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "present")]
    pub opening: Option<R::Chance>,
    /// Committed moves with the chances drawn after them.
    pub plies: Vec<Ply<R>>,
    /// Current board.
    pub board: R::Board,
    /// Result, once ended.
    pub outcome: Option<Outcome>,
    /// Rematch votes indexed by color.
    pub rematch_votes: [bool; 2],
    /// Departed flags indexed by color.
    pub departed: [bool; 2],
    /// Version counter.
    pub version: u64,
    /// Fault description, if the session is faulted.
    pub faulted: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last change.
    pub updated_at: DateTime<Utc>,
}

/// Read-only view of a session at one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, new)]
pub struct SessionSnapshot {
    id: SessionId,
    kind: GameKind,
    status: SessionStatus,
    white: Option<Player>,
    black: Option<Player>,
    side_to_move: Option<Color>,
    /// Side to move is in check (always false for backgammon).
    #[serde(default)]
    check: bool,
    board: serde_json::Value,
    legal_moves: Vec<serde_json::Value>,
    last_move: Option<serde_json::Value>,
    outcome: Option<Outcome>,
    plies: usize,
    version: u64,
    faulted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Player seated as `color`.
    pub fn player(&self, color: Color) -> Option<&Player> {
        match color {
            Color::White => self.white.as_ref(),
            Color::Black => self.black.as_ref(),
        }
    }
}

/// Serde adapter for optional chances whose value may itself serialize as
/// `null` (chess draws `()`). A present field is always `Some`; an absent
/// field is `None`. Pair with `default` and `skip_serializing_if`.
pub(crate) mod present {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(crate) fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Some)
    }
}
