//! Structural invariants of a chess board.
//!
//! These are checked when a position is parsed and after every committed
//! move. A violation means the engine produced (or was fed) an impossible
//! position.

use crate::{ChessBoard, PieceKind, Square};
use strictly_rules::{Color, Invariant};

/// Invariant: each side has exactly one king.
pub struct OneKingEach;

impl Invariant<ChessBoard> for OneKingEach {
    fn holds(board: &ChessBoard) -> bool {
        [Color::White, Color::Black].into_iter().all(|color| {
            board
                .pieces(color)
                .filter(|(_, piece)| piece.kind == PieceKind::King)
                .count()
                == 1
        })
    }

    fn description() -> &'static str {
        "Each side has exactly one king"
    }
}

/// Invariant: no pawn stands on the first or eighth rank.
pub struct NoPawnsOnBackRanks;

impl Invariant<ChessBoard> for NoPawnsOnBackRanks {
    fn holds(board: &ChessBoard) -> bool {
        Square::all()
            .filter(|sq| sq.rank() == 0 || sq.rank() == 7)
            .all(|sq| board.piece_at(sq).is_none_or(|piece| piece.kind != PieceKind::Pawn))
    }

    fn description() -> &'static str {
        "No pawns on the first or eighth rank"
    }
}

/// Invariant: piece counts stay within what a game can produce.
///
/// At most 16 pieces and 8 pawns per side; captures and promotions can only
/// lower or trade these counts.
pub struct PieceBudget;

impl Invariant<ChessBoard> for PieceBudget {
    fn holds(board: &ChessBoard) -> bool {
        [Color::White, Color::Black].into_iter().all(|color| {
            let pieces = board.pieces(color).count();
            let pawns = board
                .pieces(color)
                .filter(|(_, piece)| piece.kind == PieceKind::Pawn)
                .count();
            pieces <= 16 && pawns <= 8
        })
    }

    fn description() -> &'static str {
        "Each side has at most 16 pieces and 8 pawns"
    }
}

/// Invariant: the side that just moved did not leave its king in check.
pub struct WaitingSideNotInCheck;

impl Invariant<ChessBoard> for WaitingSideNotInCheck {
    fn holds(board: &ChessBoard) -> bool {
        !board.is_in_check(board.side_to_move().opponent())
    }

    fn description() -> &'static str {
        "The side not to move is not in check"
    }
}

/// All chess board invariants as a composable set.
pub type ChessInvariants = (
    OneKingEach,
    NoPawnsOnBackRanks,
    PieceBudget,
    WaitingSideNotInCheck,
);
