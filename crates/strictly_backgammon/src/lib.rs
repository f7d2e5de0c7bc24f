//! Pure backgammon rules for strictly_boards.
//!
//! This crate owns the backgammon board, checker movement under a roll, and
//! the move tree that enumerates every maximal way to play a roll. It has no
//! I/O and no session concepts: the server drives it through
//! [`strictly_rules::GameRules`] via the [`Backgammon`] rules value.
//!
//! # Point numbering
//!
//! Points are numbered 1 to 24 from White's side of the board. White moves
//! from 24 towards 1 and bears off from its home board (points 1 to 6).
//! Black moves from 1 towards 24 with its home board on points 19 to 24.
//!
//! # Example
//!
//! ```
//! use strictly_backgammon::{BackgammonBoard, MoveTree, Roll};
//!
//! // White to move with double sixes from the starting position.
//! let tree = MoveTree::build(&BackgammonBoard::standard(), Roll::new(6, 6).unwrap());
//! assert_eq!(tree.max_legs(), 4);
//! assert!(tree.forfeited_dice().is_empty());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod dice;
mod invariants;
mod movegen;
mod moves;
mod rules;
mod tree;

pub use board::{BackgammonBoard, CHECKERS_PER_SIDE, Point};
pub use dice::{DiceDraw, Roll};
pub use invariants::{BackgammonInvariants, CheckerConservation, DiceInRange, PointOwnership};
pub use moves::{Leg, Location, Turn};
pub use rules::{Backgammon, IllegalBackgammonMove};
pub use tree::{MoveNode, MoveTree};
