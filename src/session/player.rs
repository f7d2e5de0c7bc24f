//! Player identities seated in a session.

use derive_new::new;
use serde::{Deserialize, Serialize};

/// Unique identifier for a player.
pub type PlayerId = String;

/// Type of player.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlayerType {
    /// A person at a client.
    #[default]
    Human,
    /// A program playing through the API.
    Agent,
}

/// A player in a game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Player {
    /// Player's unique ID.
    pub id: PlayerId,
    /// Player's name.
    pub name: String,
    /// Type of player.
    #[serde(default)]
    pub player_type: PlayerType,
}

impl Player {
    /// A human player whose display name is its id.
    pub fn human(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id, PlayerType::Human)
    }
}
