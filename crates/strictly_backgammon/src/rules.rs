//! Backgammon rules behind the shared [`GameRules`] interface.

use crate::invariants::BackgammonInvariants;
use crate::{BackgammonBoard, CHECKERS_PER_SIDE, DiceDraw, MoveTree, Roll, Turn};
use crate::board::relative;
use derive_more::Display;
use strictly_rules::{
    Color, EndReason, GameKind, GameRules, InvariantSet, InvariantViolation, Outcome, Rng,
};
use tracing::{debug, instrument};

/// Reason a backgammon turn or dice draw is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum IllegalBackgammonMove {
    /// No dice are in play.
    #[display("No dice have been rolled")]
    NoRoll,

    /// A leg uses a die value the roll does not provide (or provides fewer times).
    #[display("Die {} is not available in this roll", _0)]
    DieNotRolled(u8),

    /// The turn stops while more dice could be played.
    #[display("Turn plays {} legs but {} are playable", used, required)]
    NotMaximal {
        /// Legs submitted.
        used: usize,
        /// Legs every legal sequence contains.
        required: usize,
    },

    /// A leg is not a legal continuation of the legs before it.
    #[display("Leg at index {} is not a legal continuation", leg_index)]
    NotInMoveTree {
        /// Zero-based index of the offending leg.
        leg_index: usize,
    },

    /// The opening roll has not been thrown.
    #[display("The game has not started")]
    GameNotStarted,

    /// Dice were drawn while a roll was still in play, or the wrong kind of
    /// draw was supplied.
    #[display("Unexpected dice draw")]
    UnexpectedChance,
}

impl std::error::Error for IllegalBackgammonMove {}

/// Standard backgammon rules, without the doubling cube.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Backgammon;

impl Backgammon {
    /// The move tree for the roll in play, if any.
    pub fn move_tree(&self, board: &BackgammonBoard) -> Option<MoveTree> {
        board.dice().map(|roll| MoveTree::build(board, roll))
    }

    fn diagnose(
        board: &BackgammonBoard,
        turn: &Turn,
    ) -> Result<BackgammonBoard, IllegalBackgammonMove> {
        let roll = match board.dice() {
            Some(roll) => roll,
            None if board.turn() == 0 => return Err(IllegalBackgammonMove::GameNotStarted),
            None => return Err(IllegalBackgammonMove::NoRoll),
        };

        let mut pool = roll.dice();
        for leg in &turn.legs {
            let i = pool
                .iter()
                .position(|&d| d == leg.die)
                .ok_or(IllegalBackgammonMove::DieNotRolled(leg.die))?;
            pool.remove(i);
        }

        let tree = MoveTree::build(board, roll);
        let played = tree
            .follow(&turn.legs)
            .map_err(|leg_index| IllegalBackgammonMove::NotInMoveTree { leg_index })?;
        if played.len() < tree.max_legs() {
            return Err(IllegalBackgammonMove::NotMaximal {
                used: played.len(),
                required: tree.max_legs(),
            });
        }

        let color = board.side_to_move();
        let mut next = board.clone();
        for leg in &played {
            next.apply_leg(color, leg);
        }
        next.end_turn();
        Ok(next)
    }

    fn score(board: &BackgammonBoard, winner: Color) -> Outcome {
        let loser = winner.opponent();
        if board.off(loser) > 0 {
            return Outcome::win(winner, EndReason::BearOff, 1);
        }
        let in_winner_home = (1..=24u8)
            .any(|n| board.point(n).is_held_by(loser) && relative(winner, n) <= 6);
        if board.bar(loser) > 0 || in_winner_home {
            Outcome::win(winner, EndReason::Backgammon, 3)
        } else {
            Outcome::win(winner, EndReason::Gammon, 2)
        }
    }
}

impl GameRules for Backgammon {
    type Board = BackgammonBoard;
    type Move = Turn;
    type Chance = DiceDraw;
    type Illegal = IllegalBackgammonMove;

    const KIND: GameKind = GameKind::Backgammon;

    fn initial_board(&self) -> BackgammonBoard {
        BackgammonBoard::standard()
    }

    fn side_to_move(&self, board: &BackgammonBoard) -> Color {
        board.side_to_move()
    }

    fn draw_chance<G: Rng + ?Sized>(&self, board: &BackgammonBoard, rng: &mut G) -> DiceDraw {
        if board.turn() == 0 {
            DiceDraw::opening(rng)
        } else {
            DiceDraw::Turn(Roll::random(rng))
        }
    }

    #[instrument(skip(self, board), fields(turn = board.turn()))]
    fn begin_turn(
        &self,
        board: &BackgammonBoard,
        chance: &DiceDraw,
    ) -> Result<BackgammonBoard, IllegalBackgammonMove> {
        if board.dice().is_some() {
            return Err(IllegalBackgammonMove::UnexpectedChance);
        }
        let (color, roll) = match *chance {
            DiceDraw::Opening { white, black } if board.turn() == 0 => {
                let color = chance
                    .opening_winner()
                    .ok_or(IllegalBackgammonMove::UnexpectedChance)?;
                let roll = Roll::new(white, black).ok_or(IllegalBackgammonMove::UnexpectedChance)?;
                (color, roll)
            }
            DiceDraw::Turn(roll) if board.turn() > 0 && roll.is_valid() => {
                (board.side_to_move(), roll)
            }
            _ => return Err(IllegalBackgammonMove::UnexpectedChance),
        };
        debug!(%color, %roll, "Dice in play");
        let mut next = board.clone();
        next.start_turn(color, roll);
        Ok(next)
    }

    fn legal_moves(&self, board: &BackgammonBoard) -> Vec<Turn> {
        self.move_tree(board)
            .map(|tree| tree.sequences().into_iter().map(Turn::new).collect())
            .unwrap_or_default()
    }

    #[instrument(skip(self, board, turn), fields(color = %board.side_to_move(), turn = %turn))]
    fn validate(
        &self,
        board: &BackgammonBoard,
        turn: &Turn,
    ) -> Result<BackgammonBoard, IllegalBackgammonMove> {
        let result = Self::diagnose(board, turn);
        if let Err(e) = &result {
            debug!(reason = %e, "Rejected turn");
        }
        result
    }

    fn status(&self, board: &BackgammonBoard) -> Option<Outcome> {
        [Color::White, Color::Black]
            .into_iter()
            .find(|&color| board.off(color) == CHECKERS_PER_SIDE)
            .map(|winner| Self::score(board, winner))
    }

    fn check_board(&self, board: &BackgammonBoard) -> Result<(), Vec<InvariantViolation>> {
        BackgammonInvariants::check_all(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_draw_sets_first_player() {
        let board = Backgammon.initial_board();
        let next = Backgammon
            .begin_turn(&board, &DiceDraw::Opening { white: 2, black: 5 })
            .unwrap();
        assert_eq!(next.side_to_move(), Color::Black);
        assert_eq!(next.dice(), Roll::new(2, 5));
    }

    #[test]
    fn test_tied_opening_rejected() {
        let board = Backgammon.initial_board();
        let result = Backgammon.begin_turn(&board, &DiceDraw::Opening { white: 4, black: 4 });
        assert_eq!(result, Err(IllegalBackgammonMove::UnexpectedChance));
    }

    #[test]
    fn test_move_before_opening() {
        let result = Backgammon.validate(&Backgammon.initial_board(), &Turn::pass());
        assert_eq!(result, Err(IllegalBackgammonMove::GameNotStarted));
    }

    #[test]
    fn test_second_roll_rejected_while_dice_in_play() {
        let board = BackgammonBoard::standard().with_roll(Color::White, Roll::new(3, 1).unwrap());
        let result = Backgammon.begin_turn(&board, &DiceDraw::Turn(Roll::new(2, 2).unwrap()));
        assert_eq!(result, Err(IllegalBackgammonMove::UnexpectedChance));
    }
}
