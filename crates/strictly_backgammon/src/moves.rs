//! Checker moves.
//!
//! A [`Leg`] moves one checker by one die. A [`Turn`] is the ordered list of
//! legs a player submits for a roll; the empty turn is the pass played when
//! nothing can move.

use serde::{Deserialize, Serialize};

/// Where a checker stands or goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Waiting to re-enter after being hit.
    Bar,
    /// On point 1..=24.
    Point(u8),
    /// Borne off.
    Off,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bar => write!(f, "bar"),
            Self::Point(n) => write!(f, "{}", n),
            Self::Off => write!(f, "off"),
        }
    }
}

/// One checker moved by one die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Leg {
    /// Origin.
    pub from: Location,
    /// Destination.
    pub to: Location,
    /// Die value consumed.
    pub die: u8,
    /// Set by the engine when the leg hits a lone opposing checker.
    #[serde(default)]
    pub hit: bool,
}

impl Leg {
    /// Creates a leg without hit metadata.
    pub fn new(from: Location, to: Location, die: u8) -> Self {
        Self {
            from,
            to,
            die,
            hit: false,
        }
    }

    /// Compares origin, destination and die, ignoring hit metadata.
    pub fn same_play(&self, other: &Leg) -> bool {
        self.from == other.from && self.to == other.to && self.die == other.die
    }
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.from, self.to)?;
        if self.hit {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// Everything a player plays for one roll.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Turn {
    /// Legs in the order they are played.
    pub legs: Vec<Leg>,
}

impl Turn {
    /// Creates a turn from its legs.
    pub fn new(legs: Vec<Leg>) -> Self {
        Self { legs }
    }

    /// The empty turn, legal only when no leg can be played.
    pub fn pass() -> Self {
        Self::default()
    }

    /// Returns true for the empty turn.
    pub fn is_pass(&self) -> bool {
        self.legs.is_empty()
    }
}

impl std::fmt::Display for Turn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.legs.is_empty() {
            return write!(f, "pass");
        }
        let legs: Vec<String> = self.legs.iter().map(Leg::to_string).collect();
        write!(f, "{}", legs.join(" "))
    }
}
