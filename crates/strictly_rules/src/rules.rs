//! The capability interface every game implements.

use crate::{Color, InvariantViolation, Outcome};
use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Which game a session runs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameKind {
    /// Standard chess.
    Chess,
    /// Standard backgammon (no doubling cube).
    Backgammon,
}

/// Rules of one game.
///
/// Implementations are stateless: every method is a pure function of its
/// inputs and no reference to a board outlives a call.
///
/// A turn proceeds as follows:
///
/// 1. [`draw_chance`](GameRules::draw_chance) produces the random input for
///    the turn (dice in backgammon, `()` in chess);
/// 2. [`begin_turn`](GameRules::begin_turn) applies it to the board;
/// 3. the side to move submits a move which
///    [`validate`](GameRules::validate) turns into the next board;
/// 4. [`status`](GameRules::status) decides whether the game is over.
///
/// Chances are recorded alongside moves so a game can be replayed exactly.
pub trait GameRules: Debug + Clone + Default + Send + Sync + 'static {
    /// Immutable snapshot of the position.
    type Board: Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Unit of play submitted by a player in one turn.
    type Move: Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Random input consumed at the start of a turn.
    type Chance: Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Reason a move or chance was rejected.
    type Illegal: std::error::Error + Clone + Send + Sync + 'static;

    /// The game these rules implement.
    const KIND: GameKind;

    /// Board at the start of a game, before any chance is drawn.
    fn initial_board(&self) -> Self::Board;

    /// The side authorized to move on `board`.
    fn side_to_move(&self, board: &Self::Board) -> Color;

    /// Draws the random input for the next turn of `board`.
    fn draw_chance<G: Rng + ?Sized>(&self, board: &Self::Board, rng: &mut G) -> Self::Chance;

    /// Applies a chance to a board, returning the board the side to move plays on.
    ///
    /// # Errors
    ///
    /// Returns `Self::Illegal` if the chance does not fit the board
    /// (for instance a second roll before the first one was played).
    fn begin_turn(&self, board: &Self::Board, chance: &Self::Chance) -> Result<Self::Board, Self::Illegal>;

    /// Every legal move for the side to move.
    fn legal_moves(&self, board: &Self::Board) -> Vec<Self::Move>;

    /// Validates a move and produces the resulting board.
    ///
    /// # Errors
    ///
    /// Returns `Self::Illegal` with the specific reason the move is rejected.
    fn validate(&self, board: &Self::Board, mv: &Self::Move) -> Result<Self::Board, Self::Illegal>;

    /// Terminal result of `board`, or `None` while play continues.
    fn status(&self, board: &Self::Board) -> Option<Outcome>;

    /// Returns true when the side to move on `board` is in check.
    ///
    /// Games without check keep the default.
    fn in_check(&self, _board: &Self::Board) -> bool {
        false
    }

    /// Checks structural invariants of `board` (piece conservation and the like).
    ///
    /// # Errors
    ///
    /// Returns every violated invariant.
    fn check_board(&self, board: &Self::Board) -> Result<(), Vec<InvariantViolation>>;

    /// Returns the game kind of these rules.
    fn kind(&self) -> GameKind {
        Self::KIND
    }
}
