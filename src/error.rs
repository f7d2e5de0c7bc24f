//! Errors returned by session operations.

use crate::session::SessionId;
use derive_more::Display;

/// Why a session operation was refused.
///
/// Every variant except [`SessionError::InvariantViolation`] leaves the
/// session unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SessionError {
    /// The move failed rule validation.
    #[display("Illegal move: {}", _0)]
    IllegalMove(String),

    /// The caller may not perform this action now (unknown player, not
    /// their turn, stale timer).
    #[display("Forbidden: {}", _0)]
    Forbidden(String),

    /// No session with this id is loaded.
    #[display("Session {} not found", _0)]
    SessionNotFound(SessionId),

    /// Both seats are taken by other players.
    #[display("Session {} already has two players", _0)]
    SessionFull(SessionId),

    /// The game is over.
    #[display("Session {} has ended", _0)]
    SessionEnded(SessionId),

    /// The game has not started yet.
    #[display("Session {} has not started", _0)]
    NotStarted(SessionId),

    /// A session with this id already exists.
    #[display("Session {} already exists", _0)]
    SessionExists(SessionId),

    /// Internal state is inconsistent. The session is faulted.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IllegalMove(_) => "illegal_move",
            Self::Forbidden(_) => "forbidden",
            Self::SessionNotFound(_) => "session_not_found",
            Self::SessionFull(_) => "session_full",
            Self::SessionEnded(_) => "session_ended",
            Self::NotStarted(_) => "not_started",
            Self::SessionExists(_) => "session_exists",
            Self::InvariantViolation(_) => "invariant_violation",
        }
    }
}
