//! Shared rule-engine interface for strictly_boards games.
//!
//! Game crates implement [`GameRules`] once per game; the session state
//! machine is written against this trait only and never inspects which game
//! it is running.
//!
//! # Architecture
//!
//! - **Color**: the two sides of every supported game
//! - **Outcome**: winner, end reason and points of a finished game
//! - **GameRules**: the capability interface (legal moves, validation,
//!   terminal detection, chance input)
//! - **Invariants**: composable board checks run after every commit

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod color;
mod invariants;
mod outcome;
mod rules;

pub use color::Color;
pub use invariants::{Invariant, InvariantSet, InvariantViolation};
pub use outcome::{EndReason, Outcome};
pub use rules::{GameKind, GameRules};

/// Random source accepted by [`GameRules::draw_chance`].
pub use rand::Rng;
