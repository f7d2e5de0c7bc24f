//! The two sides of a board game.

use serde::{Deserialize, Serialize};

/// A side in a two-player game.
///
/// Chess uses White/Black directly. Backgammon maps its two checker colors
/// onto the same pair so sessions can seat players uniformly.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    /// White (moves first in chess).
    White,
    /// Black.
    Black,
}

impl Color {
    /// Returns the opposing side.
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Stable array index (White = 0, Black = 1).
    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}
