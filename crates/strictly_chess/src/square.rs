//! Board squares in algebraic notation.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One of the 64 squares, indexed `rank * 8 + file` with a1 = 0.
///
/// Serializes as its algebraic name (`"e4"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square(u8);

impl Square {
    /// Creates a square from zero-based file (a = 0) and rank (1 = 0).
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then(|| Self(rank * 8 + file))
    }

    /// Creates a square from its 0..64 index.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < 64).then_some(Self(index as u8))
    }

    /// The 0..64 index.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Zero-based file (a = 0).
    pub fn file(self) -> u8 {
        self.0 % 8
    }

    /// Zero-based rank (rank 1 = 0).
    pub fn rank(self) -> u8 {
        self.0 / 8
    }

    /// Returns true for light squares (a1 is dark).
    pub fn is_light(self) -> bool {
        (self.file() + self.rank()) % 2 == 1
    }

    /// The square `df` files and `dr` ranks away, if still on the board.
    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let file = self.file() as i8 + df;
        let rank = self.rank() as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Self::new(file as u8, rank as u8)
        } else {
            None
        }
    }

    /// All squares from a1 to h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0u8..64).map(Square)
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, self.rank() + 1)
    }
}

/// Text that is not an algebraic square name.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("Invalid square '{}'", input)]
pub struct ParseSquareError {
    /// The rejected input.
    pub input: String,
}

impl std::error::Error for ParseSquareError {}

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSquareError {
            input: s.to_string(),
        };
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(err());
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::new(file, rank).ok_or_else(err)
    }
}

impl TryFrom<String> for Square {
    type Error = ParseSquareError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}
