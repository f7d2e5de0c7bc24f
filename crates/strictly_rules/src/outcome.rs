//! Terminal results shared by every game.

use crate::Color;
use serde::{Deserialize, Serialize};

/// Why a game ended.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EndReason {
    /// Chess: side to move is in check with no legal move.
    Checkmate,
    /// Chess: side to move has no legal move and is not in check.
    Stalemate,
    /// Chess: one hundred half-moves without a capture or pawn move.
    FiftyMoveRule,
    /// Chess: neither side can deliver mate.
    InsufficientMaterial,
    /// Backgammon: winner bore off all checkers, loser had borne off some.
    BearOff,
    /// Backgammon: loser had borne off no checkers.
    Gammon,
    /// Backgammon: gammon with a loser checker on the bar or in the winner's home board.
    Backgammon,
    /// A player resigned.
    Resignation,
    /// The side to move ran out of time.
    Timeout,
    /// A player left, or the session was ended administratively.
    Abandoned,
}

impl EndReason {
    /// Returns true for endings read off the board rather than caused by a
    /// player or the clock.
    pub fn is_positional(self) -> bool {
        !matches!(self, Self::Resignation | Self::Timeout | Self::Abandoned)
    }
}

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    winner: Option<Color>,
    reason: EndReason,
    points: u32,
}

impl Outcome {
    /// A decisive result worth `points` to the winner.
    pub fn win(winner: Color, reason: EndReason, points: u32) -> Self {
        Self {
            winner: Some(winner),
            reason,
            points,
        }
    }

    /// A result with no winner.
    pub fn draw(reason: EndReason) -> Self {
        Self {
            winner: None,
            reason,
            points: 0,
        }
    }

    /// The winning side, if any.
    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    /// Why the game ended.
    pub fn reason(&self) -> EndReason {
        self.reason
    }

    /// Points scored by the winner (1 for chess, 1/2/3 for backgammon).
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Returns true if nobody won.
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.winner {
            Some(color) => write!(f, "{} wins by {} ({} pt)", color, self.reason, self.points),
            None => write!(f, "no winner ({})", self.reason),
        }
    }
}
