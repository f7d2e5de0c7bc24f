//! Game sessions: the state machine, its records and the registry.

mod dynamic;
mod machine;
mod player;
mod record;
mod registry;

pub use dynamic::{SessionOps, new_session, restore_session};
pub use machine::{GameSession, Ply, SessionStatus};
pub use player::{Player, PlayerId, PlayerType};
pub use record::{SessionRecord, SessionSnapshot};
pub use registry::{SessionCell, SessionEntry, SessionRegistry};

/// Unique identifier for a game session.
pub type SessionId = String;
