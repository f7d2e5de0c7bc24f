//! SQLite persistence for session snapshots and finished games.

mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use models::{GameOutcome, GameResult, NewGameResult, PlayerRecord, SnapshotRow};
pub use repository::GameRepository;
