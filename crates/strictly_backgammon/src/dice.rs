//! Dice rolls and the chance drawn at the start of each turn.

use serde::{Deserialize, Serialize};
use strictly_rules::{Color, Rng};

/// Two dice thrown for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roll {
    first: u8,
    second: u8,
}

impl Roll {
    /// Creates a roll, or `None` if either die is outside 1..=6.
    pub fn new(first: u8, second: u8) -> Option<Self> {
        (Self::is_face(first) && Self::is_face(second)).then_some(Self { first, second })
    }

    /// Throws two fair dice.
    pub fn random<G: Rng + ?Sized>(rng: &mut G) -> Self {
        Self {
            first: rng.gen_range(1..=6),
            second: rng.gen_range(1..=6),
        }
    }

    pub(crate) fn is_face(die: u8) -> bool {
        (1..=6).contains(&die)
    }

    /// First die.
    pub fn first(&self) -> u8 {
        self.first
    }

    /// Second die.
    pub fn second(&self) -> u8 {
        self.second
    }

    /// Both dice show the same face.
    pub fn is_double(&self) -> bool {
        self.first == self.second
    }

    /// Higher die of the roll.
    pub fn higher(&self) -> u8 {
        self.first.max(self.second)
    }

    /// The pool of die values this roll allows: four copies for a double,
    /// otherwise the two dice, highest first.
    pub fn dice(&self) -> Vec<u8> {
        if self.is_double() {
            vec![self.first; 4]
        } else {
            vec![self.higher(), self.first.min(self.second)]
        }
    }

    /// Returns true if both dice are valid faces.
    pub fn is_valid(&self) -> bool {
        Self::is_face(self.first) && Self::is_face(self.second)
    }
}

impl std::fmt::Display for Roll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

/// Random input consumed at the start of a backgammon turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiceDraw {
    /// Each side throws one die; the higher die moves first using both.
    Opening {
        /// White's die.
        white: u8,
        /// Black's die.
        black: u8,
    },
    /// The side to move throws both dice.
    Turn(Roll),
}

impl DiceDraw {
    /// Throws the opening dice, re-rolling ties.
    pub fn opening<G: Rng + ?Sized>(rng: &mut G) -> Self {
        loop {
            let white = rng.gen_range(1..=6);
            let black = rng.gen_range(1..=6);
            if white != black {
                return Self::Opening { white, black };
            }
        }
    }

    /// Side that moves first after an opening draw, or `None` for a tie or a
    /// regular turn draw.
    pub fn opening_winner(&self) -> Option<Color> {
        match *self {
            Self::Opening { white, black } if white > black => Some(Color::White),
            Self::Opening { white, black } if black > white => Some(Color::Black),
            _ => None,
        }
    }
}
