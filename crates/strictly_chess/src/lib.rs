//! Pure chess rules for strictly_boards.
//!
//! This crate owns the chess board representation and the move legality
//! engine. It has no I/O and no session concepts: the server drives it
//! through [`strictly_rules::GameRules`] via the [`Chess`] rules value.
//!
//! # Example
//!
//! ```
//! use strictly_chess::{Chess, ChessMove};
//! use strictly_rules::{Color, GameRules};
//!
//! let rules = Chess;
//! let board = rules.initial_board();
//! let mv: ChessMove = "e2-e4".parse().unwrap();
//! let next = rules.validate(&board, &mv).unwrap();
//! assert_eq!(rules.side_to_move(&next), Color::Black);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod invariants;
mod movegen;
mod moves;
mod piece;
mod rules;
mod square;

pub use board::{CastlingRights, ChessBoard, FenError};
pub use invariants::{
    ChessInvariants, NoPawnsOnBackRanks, OneKingEach, PieceBudget, WaitingSideNotInCheck,
};
pub use moves::{CastleSide, ChessMove, MoveDetails, ParseMoveError};
pub use piece::{Piece, PieceKind};
pub use rules::{Chess, IllegalChessMove};
pub use square::{ParseSquareError, Square};
