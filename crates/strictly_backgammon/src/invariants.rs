//! Structural invariants of a backgammon board.

use crate::{BackgammonBoard, CHECKERS_PER_SIDE};
use strictly_rules::{Color, Invariant};

/// Invariant: each side has exactly 15 checkers across points, bar and off.
pub struct CheckerConservation;

impl Invariant<BackgammonBoard> for CheckerConservation {
    fn holds(board: &BackgammonBoard) -> bool {
        [Color::White, Color::Black].into_iter().all(|color| {
            u16::from(board.on_points(color))
                + u16::from(board.bar(color))
                + u16::from(board.off(color))
                == u16::from(CHECKERS_PER_SIDE)
        })
    }

    fn description() -> &'static str {
        "Each side has exactly 15 checkers"
    }
}

/// Invariant: a point has an owner exactly when it holds checkers.
pub struct PointOwnership;

impl Invariant<BackgammonBoard> for PointOwnership {
    fn holds(board: &BackgammonBoard) -> bool {
        board
            .points()
            .iter()
            .all(|p| p.owner.is_none() == (p.count == 0))
    }

    fn description() -> &'static str {
        "Points have an owner exactly when occupied"
    }
}

/// Invariant: dice in play show faces 1 to 6.
pub struct DiceInRange;

impl Invariant<BackgammonBoard> for DiceInRange {
    fn holds(board: &BackgammonBoard) -> bool {
        board.dice().is_none_or(|roll| roll.is_valid())
    }

    fn description() -> &'static str {
        "Dice show faces 1 to 6"
    }
}

/// All backgammon board invariants.
pub type BackgammonInvariants = (CheckerConservation, PointOwnership, DiceInRange);
