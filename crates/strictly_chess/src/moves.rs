//! Chess moves as first-class values.
//!
//! A [`ChessMove`] is what a player submits: origin, destination and an
//! optional promotion piece. Capture, castling and en-passant metadata is not
//! part of the submission; it is derived from the board the move was generated
//! on (see [`ChessBoard::details`](crate::ChessBoard::details)).

use crate::{PieceKind, Square};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single move: one piece from one square to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChessMove {
    /// Origin square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
    /// Piece a pawn promotes to on the last rank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}

impl ChessMove {
    /// Creates a non-promoting move.
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Creates a promoting pawn move.
    pub fn promoting(from: Square, to: Square, kind: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(kind),
        }
    }
}

impl std::fmt::Display for ChessMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "={}", kind.symbol().to_ascii_uppercase())?;
        }
        Ok(())
    }
}

/// Text that is not a move in coordinate notation.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("Invalid move '{}': expected coordinates like e2-e4 or e7e8q", input)]
pub struct ParseMoveError {
    /// The rejected input.
    pub input: String,
}

impl std::error::Error for ParseMoveError {}

impl FromStr for ChessMove {
    type Err = ParseMoveError;

    /// Accepts `e2-e4`, `e2e4`, `e7e8q` and `e7-e8=Q`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMoveError {
            input: s.to_string(),
        };
        let compact: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '=' | 'x'))
            .collect();
        if !compact.is_ascii() || !(4..=5).contains(&compact.len()) {
            return Err(err());
        }
        let from: Square = compact[0..2].parse().map_err(|_| err())?;
        let to: Square = compact[2..4].parse().map_err(|_| err())?;
        let promotion = match compact[4..].chars().next() {
            None => None,
            Some(c) => Some(
                PieceKind::from_symbol(c)
                    .filter(|kind| kind.is_promotion_target())
                    .ok_or_else(err)?,
            ),
        };
        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

/// Which side of the board a castle goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastleSide {
    /// Short castle (king to the g-file).
    Kingside,
    /// Long castle (king to the c-file).
    Queenside,
}

/// Metadata of a move relative to the board it is played on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveDetails {
    /// Kind of the moving piece.
    pub piece: Option<PieceKind>,
    /// Kind of the captured piece, including en-passant captures.
    pub capture: Option<PieceKind>,
    /// Set for en-passant captures.
    pub en_passant: bool,
    /// Set for castling moves.
    pub castle: Option<CastleSide>,
    /// Promotion piece.
    pub promotion: Option<PieceKind>,
    /// Set for a pawn's two-square advance.
    pub double_push: bool,
}
