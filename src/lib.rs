//! Strictly Boards - rule-checked chess and backgammon sessions
//!
//! The rules live in their own crates (`strictly_chess`,
//! `strictly_backgammon`) behind the [`strictly_rules::GameRules`] trait.
//! This crate runs games on top of them.
//!
//! # Architecture
//!
//! - **Session**: the generic [`GameSession`] state machine and the
//!   [`SessionRegistry`] of live sessions
//! - **Service**: [`GameService`], the inbound API (persistence, timers,
//!   observers)
//! - **Store**: [`SnapshotStore`] with in-memory and SQLite implementations
//! - **HTTP**: an axum [`router`] over the service
//!
//! # Example
//!
//! ```
//! use strictly_boards::{GameService, Player, ServiceConfig, SessionStatus};
//! use strictly_rules::GameKind;
//!
//! let service = GameService::in_memory(ServiceConfig::default().with_seed(Some(7)));
//! let id = service
//!     .create_session(GameKind::Chess, Player::human("alice"), None)
//!     .unwrap()
//!     .into_value();
//! service.join_session(&id, Player::human("bob")).unwrap();
//! service
//!     .submit_move(&id, "alice", serde_json::json!({ "from": "e2", "to": "e4" }))
//!     .unwrap();
//! let state = service.get_state(&id).unwrap();
//! assert_eq!(state.status(), &SessionStatus::InProgress);
//! assert_eq!(state.plies(), &1);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod db;
mod error;
mod http;
mod notify;
mod service;
mod session;
mod store;
mod timer;

pub use config::{ConfigError, DATABASE_URL_ENV, ServerConfig};
pub use db::{GameOutcome, GameRepository, GameResult, NewGameResult, PlayerRecord, SnapshotRow};
pub use error::SessionError;
pub use http::{ApiError, router, status_for};
pub use notify::{GameObserver, GameSummary, NotifyError, ResultRecorder, TracingObserver};
pub use service::{Durability, GameService, Receipt, ServiceConfig};
pub use session::{
    GameSession, Player, PlayerId, PlayerType, Ply, SessionCell, SessionEntry, SessionId,
    SessionOps, SessionRecord, SessionRegistry, SessionSnapshot, SessionStatus, new_session,
    restore_session,
};
pub use store::{MemoryStore, SnapshotStore, StoreError, StoredSession};
pub use timer::TimerSlot;
