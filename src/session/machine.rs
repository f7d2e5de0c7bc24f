//! The game session state machine.
//!
//! [`GameSession`] is generic over [`GameRules`] and never looks at which
//! game it runs. It owns the seats, the append-only list of boards and the
//! move history, and it is the only place where a board is committed.

use super::record::{SessionRecord, SessionSnapshot};
use super::{Player, SessionId};
use crate::error::SessionError;
use crate::notify::GameSummary;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strictly_rules::{Color, EndReason, GameRules, InvariantViolation, Outcome, Rng};
use tracing::{debug, error, info, instrument, warn};

/// Lifecycle state of a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    /// Waiting for players (or for a rematch to begin).
    NotStarted,
    /// Moves are being played.
    InProgress,
    /// The game is over.
    Ended,
}

/// One committed move.
#[derive(Debug, Clone, Serialize, Deserialize, Getters)]
#[serde(bound = "")]
pub struct Ply<R: GameRules> {
    /// 1-based position in the history.
    number: u32,
    /// Side that played the move.
    color: Color,
    /// The move as submitted.
    #[serde(rename = "move")]
    mv: R::Move,
    /// Chance drawn for the following turn, `None` if the move ended the game.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "super::record::present")]
    chance: Option<R::Chance>,
    /// Index into [`GameSession::boards`] of the board the move produced.
    board: usize,
}

/// A two-player game session.
#[derive(Debug, Clone)]
pub struct GameSession<R: GameRules> {
    id: SessionId,
    rules: R,
    white: Option<Player>,
    black: Option<Player>,
    status: SessionStatus,
    initial: R::Board,
    boards: Vec<R::Board>,
    history: Vec<Ply<R>>,
    opening: Option<R::Chance>,
    outcome: Option<Outcome>,
    rematch_votes: [bool; 2],
    departed: [bool; 2],
    version: u64,
    faulted: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<R: GameRules> GameSession<R> {
    /// Creates a session with `creator` seated as White.
    #[instrument(skip(rules, creator), fields(session_id = %id, kind = %R::KIND, player_id = %creator.id))]
    pub fn create(id: SessionId, rules: R, creator: Player) -> Self {
        info!("Creating game session");
        let now = Utc::now();
        Self {
            id,
            initial: rules.initial_board(),
            rules,
            white: Some(creator),
            black: None,
            status: SessionStatus::NotStarted,
            boards: Vec::new(),
            history: Vec::new(),
            opening: None,
            outcome: None,
            rematch_votes: [false; 2],
            departed: [false; 2],
            version: 0,
            faulted: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Rules value the session runs.
    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Lifecycle state.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Player seated as `color`.
    pub fn player(&self, color: Color) -> Option<&Player> {
        match color {
            Color::White => self.white.as_ref(),
            Color::Black => self.black.as_ref(),
        }
    }

    /// Seat held by `player_id`.
    pub fn seat_of(&self, player_id: &str) -> Option<Color> {
        [Color::White, Color::Black]
            .into_iter()
            .find(|&color| self.player(color).is_some_and(|p| p.id == player_id))
    }

    /// The current board.
    pub fn board(&self) -> &R::Board {
        self.boards.last().unwrap_or(&self.initial)
    }

    /// Boards produced since the start of the game, oldest first.
    pub fn boards(&self) -> &[R::Board] {
        &self.boards
    }

    /// Committed moves, oldest first.
    pub fn history(&self) -> &[Ply<R>] {
        &self.history
    }

    /// Chance drawn when the game started.
    pub fn opening(&self) -> Option<&R::Chance> {
        self.opening.as_ref()
    }

    /// Result once the game has ended.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Counter incremented by every state change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns true once an invariant violation has been detected.
    pub fn is_faulted(&self) -> bool {
        self.faulted.is_some()
    }

    /// Time of the last state change.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Side to move while the game is in progress.
    pub fn side_to_move(&self) -> Option<Color> {
        (self.status == SessionStatus::InProgress).then(|| self.rules.side_to_move(self.board()))
    }

    /// Legal moves for the side to move; empty unless in progress.
    pub fn legal_moves(&self) -> Vec<R::Move> {
        if self.status == SessionStatus::InProgress {
            self.rules.legal_moves(self.board())
        } else {
            Vec::new()
        }
    }

    /// Returns true when every seated player has left.
    pub fn is_deserted(&self) -> bool {
        [Color::White, Color::Black]
            .into_iter()
            .all(|color| self.player(color).is_none() || self.departed[color.index()])
    }

    /// Seats `player`, starting the game once both seats are filled.
    ///
    /// Joining again with a seated id is a no-op that reports the seat, and
    /// clears the departed flag of a player resuming after a disconnect.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionFull`] when both seats belong to others,
    /// [`SessionError::SessionEnded`] for a new player after the game ended.
    #[instrument(skip(self, player, rng), fields(session_id = %self.id, player_id = %player.id))]
    pub fn join<G: Rng + ?Sized>(&mut self, player: Player, rng: &mut G) -> Result<Color, SessionError> {
        if let Some(color) = self.seat_of(&player.id) {
            if self.departed[color.index()] {
                self.departed[color.index()] = false;
                self.touch();
                info!(%color, "Player resumed");
            } else {
                debug!(%color, "Player already seated");
            }
            return Ok(color);
        }

        if self.status == SessionStatus::Ended {
            warn!("Join after game ended");
            return Err(SessionError::SessionEnded(self.id.clone()));
        }

        let color = match (&self.white, &self.black) {
            (None, _) => Color::White,
            (_, None) => Color::Black,
            _ => {
                warn!("Session already has 2 players");
                return Err(SessionError::SessionFull(self.id.clone()));
            }
        };
        info!(%color, "Seating player");
        match color {
            Color::White => self.white = Some(player),
            Color::Black => self.black = Some(player),
        }

        if self.white.is_some() && self.black.is_some() {
            self.start(rng)?;
        }
        self.touch();
        Ok(color)
    }

    /// Validates and commits a move by `player_id`.
    ///
    /// # Errors
    ///
    /// In order of precedence: [`SessionError::InvariantViolation`] for a
    /// faulted session, [`SessionError::SessionEnded`],
    /// [`SessionError::NotStarted`], [`SessionError::Forbidden`] for an
    /// unknown player or out-of-turn move, [`SessionError::IllegalMove`]
    /// when the rules reject the move.
    #[instrument(skip(self, mv, rng), fields(session_id = %self.id, player_id = %player_id))]
    pub fn submit<G: Rng + ?Sized>(
        &mut self,
        player_id: &str,
        mv: R::Move,
        rng: &mut G,
    ) -> Result<(), SessionError> {
        let color = self.authorize(player_id)?;
        let to_move = self.rules.side_to_move(self.board());
        if color != to_move {
            warn!(%color, %to_move, "Player tried to move out of turn");
            return Err(SessionError::Forbidden(format!(
                "Not your turn. Waiting for {}",
                to_move
            )));
        }

        let next = self.rules.validate(self.board(), &mv).map_err(|e| {
            warn!(error = %e, ?mv, "Illegal move");
            SessionError::IllegalMove(e.to_string())
        })?;
        if let Err(violations) = self.rules.check_board(&next) {
            return Err(self.fault(&violations));
        }

        self.boards.push(next);
        let mut ply = Ply {
            number: self.history.len() as u32 + 1,
            color,
            mv,
            chance: None,
            board: self.boards.len() - 1,
        };

        match self.rules.status(self.board()) {
            Some(outcome) => {
                self.history.push(ply);
                self.finish(outcome);
            }
            None => {
                let chance = self.rules.draw_chance(self.board(), rng);
                let started = self.rules.begin_turn(self.board(), &chance);
                let started = match started {
                    Ok(board) => board,
                    Err(e) => {
                        self.history.push(ply);
                        return Err(self.fault(&[InvariantViolation::new(format!(
                            "Drawn chance rejected: {}",
                            e
                        ))]));
                    }
                };
                self.boards.push(started);
                ply.chance = Some(chance);
                self.history.push(ply);
            }
        }

        self.touch();
        info!(ply = self.history.len(), status = %self.status, "Move committed");
        Ok(())
    }

    /// Ends the game in the opponent's favor.
    ///
    /// # Errors
    ///
    /// Same precedence as [`submit`](Self::submit) up to the seat check.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn resign(&mut self, player_id: &str) -> Result<Outcome, SessionError> {
        let color = self.authorize(player_id)?;
        let outcome = Outcome::win(color.opponent(), EndReason::Resignation, 1);
        self.finish(outcome);
        self.touch();
        Ok(outcome)
    }

    /// Ends the game against the side to move when its turn timer fires.
    ///
    /// `version` is the version the timer was armed at.
    ///
    /// # Errors
    ///
    /// [`SessionError::Forbidden`] when the session changed since the timer
    /// was armed.
    #[instrument(skip(self), fields(session_id = %self.id, current = self.version))]
    pub fn expire_turn(&mut self, version: u64) -> Result<Outcome, SessionError> {
        self.check_live()?;
        if version != self.version {
            debug!("Stale turn timer");
            return Err(SessionError::Forbidden(format!(
                "Timer for version {} is stale (now {})",
                version, self.version
            )));
        }
        if self.status == SessionStatus::NotStarted {
            return Err(SessionError::NotStarted(self.id.clone()));
        }
        let loser = self.rules.side_to_move(self.board());
        let outcome = Outcome::win(loser.opponent(), EndReason::Timeout, 1);
        warn!(%loser, "Turn timer expired");
        self.finish(outcome);
        self.touch();
        Ok(outcome)
    }

    /// Marks `player_id` as departed. Leaving a game in progress forfeits
    /// it; leaving before the start frees the seat.
    ///
    /// Returns true when no seated player remains.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvariantViolation`] for a faulted session,
    /// [`SessionError::Forbidden`] for a player not seated here.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn leave(&mut self, player_id: &str) -> Result<bool, SessionError> {
        if let Some(reason) = &self.faulted {
            return Err(SessionError::InvariantViolation(reason.clone()));
        }
        let color = self.seat_of(player_id).ok_or_else(|| {
            warn!("Unknown player tried to leave");
            SessionError::Forbidden(format!("{} is not seated in this session", player_id))
        })?;

        match self.status {
            SessionStatus::NotStarted => match color {
                Color::White => self.white = None,
                Color::Black => self.black = None,
            },
            SessionStatus::InProgress => {
                self.departed[color.index()] = true;
                self.finish(Outcome::win(color.opponent(), EndReason::Abandoned, 1));
            }
            SessionStatus::Ended => self.departed[color.index()] = true,
        }
        self.rematch_votes = [false; 2];
        self.touch();
        info!(%color, deserted = self.is_deserted(), "Player left");
        Ok(self.is_deserted())
    }

    /// Forcibly ends the game with no winner.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionEnded`] if the game already ended.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn abandon(&mut self) -> Result<Outcome, SessionError> {
        if self.status == SessionStatus::Ended {
            return Err(SessionError::SessionEnded(self.id.clone()));
        }
        let outcome = Outcome::draw(EndReason::Abandoned);
        self.finish(outcome);
        self.touch();
        Ok(outcome)
    }

    /// Records a rematch vote. When both players have voted the session
    /// restarts with colors swapped.
    ///
    /// Returns true if the rematch started.
    ///
    /// # Errors
    ///
    /// [`SessionError::Forbidden`] unless the game has ended, the caller is
    /// seated and the opponent is still present.
    #[instrument(skip(self, rng), fields(session_id = %self.id))]
    pub fn request_rematch<G: Rng + ?Sized>(
        &mut self,
        player_id: &str,
        rng: &mut G,
    ) -> Result<bool, SessionError> {
        if let Some(reason) = &self.faulted {
            return Err(SessionError::InvariantViolation(reason.clone()));
        }
        let color = self.seat_of(player_id).ok_or_else(|| {
            SessionError::Forbidden(format!("{} is not seated in this session", player_id))
        })?;
        if self.status != SessionStatus::Ended {
            return Err(SessionError::Forbidden("Rematch only after the game ends".to_string()));
        }
        if self.departed.iter().any(|&gone| gone) {
            return Err(SessionError::Forbidden("A player has left the session".to_string()));
        }

        self.rematch_votes[color.index()] = true;
        if !self.rematch_votes.iter().all(|&vote| vote) {
            info!(%color, "Rematch requested");
            self.touch();
            return Ok(false);
        }

        info!("Starting rematch with colors swapped");
        std::mem::swap(&mut self.white, &mut self.black);
        self.initial = self.rules.initial_board();
        self.boards.clear();
        self.history.clear();
        self.opening = None;
        self.outcome = None;
        self.rematch_votes = [false; 2];
        self.status = SessionStatus::NotStarted;
        self.start(rng)?;
        self.touch();
        Ok(true)
    }

    /// Serializable record sufficient to rebuild the session.
    pub fn record(&self) -> SessionRecord<R> {
        SessionRecord {
            id: self.id.clone(),
            kind: R::KIND,
            white: self.white.clone(),
            black: self.black.clone(),
            status: self.status,
            opening: self.opening.clone(),
            plies: self.history.clone(),
            board: self.board().clone(),
            outcome: self.outcome,
            rematch_votes: self.rematch_votes,
            departed: self.departed,
            version: self.version,
            faulted: self.faulted.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Rebuilds a session by replaying the recorded history from the
    /// initial board.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvariantViolation`] if the record is for another
    /// game, a recorded move or chance is rejected on replay, the
    /// replayed board differs from the stored one, or the recorded status
    /// and outcome disagree with the replayed board.
    #[instrument(skip(rules, record), fields(session_id = %record.id, plies = record.plies.len()))]
    pub fn restore(rules: R, record: SessionRecord<R>) -> Result<Self, SessionError> {
        let corrupt = |message: String| {
            error!(%message, "Session record failed replay");
            SessionError::InvariantViolation(message)
        };
        if record.kind != R::KIND {
            return Err(corrupt(format!(
                "Record is for {} but rules are {}",
                record.kind,
                R::KIND
            )));
        }

        let mut session = Self {
            id: record.id,
            initial: rules.initial_board(),
            rules,
            white: record.white,
            black: record.black,
            status: record.status,
            boards: Vec::new(),
            history: Vec::with_capacity(record.plies.len()),
            opening: None,
            outcome: record.outcome,
            rematch_votes: record.rematch_votes,
            departed: record.departed,
            version: record.version,
            faulted: record.faulted,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };

        if let Some(chance) = record.opening {
            let started = session
                .rules
                .begin_turn(&session.initial, &chance)
                .map_err(|e| corrupt(format!("Opening chance rejected: {}", e)))?;
            session.boards.push(started);
            session.opening = Some(chance);
        } else if !record.plies.is_empty() {
            return Err(corrupt("Moves recorded without an opening".to_string()));
        }

        for ply in record.plies {
            let to_move = session.rules.side_to_move(session.board());
            if ply.color != to_move {
                return Err(corrupt(format!(
                    "Ply {} played by {} but {} was to move",
                    ply.number, ply.color, to_move
                )));
            }
            let next = session
                .rules
                .validate(session.board(), &ply.mv)
                .map_err(|e| corrupt(format!("Ply {} rejected: {}", ply.number, e)))?;
            session.boards.push(next);
            if ply.board != session.boards.len() - 1 {
                return Err(corrupt(format!("Ply {} points at the wrong board", ply.number)));
            }
            if let Some(chance) = &ply.chance {
                let started = session
                    .rules
                    .begin_turn(session.board(), chance)
                    .map_err(|e| corrupt(format!("Chance after ply {} rejected: {}", ply.number, e)))?;
                session.boards.push(started);
            }
            session.history.push(ply);
        }

        if session.board() != &record.board {
            return Err(corrupt("Replayed board differs from the stored board".to_string()));
        }
        let decided = session.rules.status(session.board());
        let consistent = match (session.status, session.outcome, decided) {
            (SessionStatus::Ended, Some(outcome), Some(result)) => outcome == result,
            (SessionStatus::Ended, Some(outcome), None) => !outcome.reason().is_positional(),
            (SessionStatus::Ended, None, _) => false,
            (_, None, None) => true,
            _ => false,
        };
        if !consistent {
            return Err(corrupt(format!(
                "Recorded {} with outcome {:?} does not match the board ({:?})",
                session.status, session.outcome, decided
            )));
        }
        if let Err(violations) = session.rules.check_board(session.board()) {
            return Err(corrupt(InvariantViolation::summarize(&violations)));
        }
        info!(version = session.version, "Session restored");
        Ok(session)
    }

    /// Read-only view published to clients.
    pub fn snapshot(&self) -> SessionSnapshot {
        let to_json = |value: serde_json::Result<serde_json::Value>| {
            value.unwrap_or(serde_json::Value::Null)
        };
        SessionSnapshot::new(
            self.id.clone(),
            R::KIND,
            self.status,
            self.white.clone(),
            self.black.clone(),
            self.side_to_move(),
            self.rules.in_check(self.board()),
            to_json(serde_json::to_value(self.board())),
            self.legal_moves()
                .iter()
                .map(|mv| to_json(serde_json::to_value(mv)))
                .collect(),
            self.history
                .last()
                .map(|ply| to_json(serde_json::to_value(&ply.mv))),
            self.outcome,
            self.history.len(),
            self.version,
            self.faulted.is_some(),
            self.created_at,
            self.updated_at,
        )
    }

    /// Summary of a finished game, `None` while it is still going.
    pub fn summary(&self) -> Option<GameSummary> {
        let outcome = self.outcome.filter(|_| self.status == SessionStatus::Ended)?;
        Some(GameSummary::new(
            self.id.clone(),
            R::KIND,
            self.white.clone(),
            self.black.clone(),
            outcome,
            self.history.len(),
            self.updated_at,
        ))
    }

    /// Seat of `player_id` if they may act on a live game.
    fn authorize(&self, player_id: &str) -> Result<Color, SessionError> {
        self.check_live()?;
        if self.status == SessionStatus::NotStarted {
            return Err(SessionError::NotStarted(self.id.clone()));
        }
        self.seat_of(player_id).ok_or_else(|| {
            warn!(player_id, "Unknown player attempted action");
            SessionError::Forbidden(format!("{} is not seated in this session", player_id))
        })
    }

    fn check_live(&self) -> Result<(), SessionError> {
        if let Some(reason) = &self.faulted {
            return Err(SessionError::InvariantViolation(reason.clone()));
        }
        if self.status == SessionStatus::Ended {
            return Err(SessionError::SessionEnded(self.id.clone()));
        }
        Ok(())
    }

    fn start<G: Rng + ?Sized>(&mut self, rng: &mut G) -> Result<(), SessionError> {
        let chance = self.rules.draw_chance(&self.initial, rng);
        let started = match self.rules.begin_turn(&self.initial, &chance) {
            Ok(board) => board,
            Err(e) => {
                return Err(self.fault(&[InvariantViolation::new(format!(
                    "Opening chance rejected: {}",
                    e
                ))]));
            }
        };
        debug!(?chance, "Opening chance drawn");
        self.boards.push(started);
        self.opening = Some(chance);
        self.status = SessionStatus::InProgress;
        info!(to_move = %self.rules.side_to_move(self.board()), "Game started");
        Ok(())
    }

    fn finish(&mut self, outcome: Outcome) {
        info!(
            winner = ?outcome.winner(),
            reason = %outcome.reason(),
            points = outcome.points(),
            "Game ended"
        );
        self.status = SessionStatus::Ended;
        self.outcome = Some(outcome);
        self.rematch_votes = [false; 2];
    }

    fn fault(&mut self, violations: &[InvariantViolation]) -> SessionError {
        let message = InvariantViolation::summarize(violations);
        error!(session_id = %self.id, %message, "Invariant violated, session faulted");
        self.faulted = Some(message.clone());
        self.touch();
        SessionError::InvariantViolation(message)
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use strictly_backgammon::{Backgammon, Turn};
    use strictly_chess::{Chess, ChessMove};

    fn mv(text: &str) -> ChessMove {
        text.parse().unwrap()
    }

    fn chess_game(rng: &mut ChaCha8Rng) -> GameSession<Chess> {
        let mut session = GameSession::create("c1".to_string(), Chess, Player::human("alice"));
        session.join(Player::human("bob"), rng).unwrap();
        session
    }

    #[test]
    fn test_join_starts_game() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let session = chess_game(&mut rng);
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.side_to_move(), Some(Color::White));
        assert_eq!(session.seat_of("bob"), Some(Color::Black));
        assert_eq!(session.version(), 1);
    }

    #[test]
    fn test_rejected_move_changes_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut session = chess_game(&mut rng);
        let before = session.record();
        let err = session.submit("alice", mv("e2-e5"), &mut rng).unwrap_err();
        assert!(matches!(err, SessionError::IllegalMove(_)));
        assert_eq!(session.version(), before.version);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_chess_record_replays() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut session = chess_game(&mut rng);
        for (player, text) in [("alice", "e2-e4"), ("bob", "e7-e5"), ("alice", "g1-f3")] {
            session.submit(player, mv(text), &mut rng).unwrap();
        }
        let json = serde_json::to_string(&session.record()).unwrap();
        let record: SessionRecord<Chess> = serde_json::from_str(&json).unwrap();
        let restored = GameSession::restore(Chess, record).unwrap();
        assert_eq!(restored.board(), session.board());
        assert_eq!(restored.boards().len(), session.boards().len());
        assert_eq!(restored.version(), session.version());
        assert_eq!(restored.side_to_move(), Some(Color::Black));
    }

    #[test]
    fn test_backgammon_record_replays_dice() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut session = GameSession::create("b1".to_string(), Backgammon, Player::human("alice"));
        session.join(Player::human("bob"), &mut rng).unwrap();
        for _ in 0..6 {
            let color = session.side_to_move().unwrap();
            let player = session.player(color).unwrap().id.clone();
            let turn: Turn = session.legal_moves().into_iter().next().unwrap();
            session.submit(&player, turn, &mut rng).unwrap();
        }
        let json = serde_json::to_string(&session.record()).unwrap();
        let record: SessionRecord<Backgammon> = serde_json::from_str(&json).unwrap();
        let restored = GameSession::restore(Backgammon, record).unwrap();
        assert_eq!(restored.board(), session.board());
        assert_eq!(restored.history().len(), 6);
    }

    #[test]
    fn test_tampered_record_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut session = chess_game(&mut rng);
        session.submit("alice", mv("e2-e4"), &mut rng).unwrap();
        let mut record = session.record();
        record.board = Chess.initial_board();
        let err = GameSession::restore(Chess, record).unwrap_err();
        assert!(matches!(err, SessionError::InvariantViolation(_)));
    }

    #[test]
    fn test_out_of_turn_ply_is_rejected_on_replay() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut session = chess_game(&mut rng);
        session.submit("alice", mv("e2-e4"), &mut rng).unwrap();
        let mut json = serde_json::to_value(session.record()).unwrap();
        json["plies"][0]["color"] = serde_json::json!("black");
        let record: SessionRecord<Chess> = serde_json::from_value(json).unwrap();
        assert!(GameSession::restore(Chess, record).is_err());
    }

    #[test]
    fn test_stale_timer_is_forbidden() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut session = chess_game(&mut rng);
        let armed_at = session.version();
        session.submit("alice", mv("d2-d4"), &mut rng).unwrap();
        let err = session.expire_turn(armed_at).unwrap_err();
        assert!(matches!(err, SessionError::Forbidden(_)));

        let outcome = session.expire_turn(session.version()).unwrap();
        assert_eq!(outcome.winner(), Some(Color::White));
        assert_eq!(outcome.reason(), EndReason::Timeout);
        assert!(matches!(
            session.expire_turn(session.version()),
            Err(SessionError::SessionEnded(_))
        ));
    }

    #[test]
    fn test_leave_before_start_frees_seat() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut session = GameSession::create("c2".to_string(), Chess, Player::human("alice"));
        assert!(session.leave("alice").unwrap());
        assert_eq!(session.player(Color::White), None);
        assert_eq!(session.join(Player::human("carol"), &mut rng).unwrap(), Color::White);
    }

    #[test]
    fn test_faulted_session_cannot_be_left() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let session = chess_game(&mut rng);
        let mut record = session.record();
        record.faulted = Some("board corrupted".to_string());
        let mut faulted = GameSession::restore(Chess, record).unwrap();

        let err = faulted.leave("alice").unwrap_err();
        assert_eq!(err, SessionError::InvariantViolation("board corrupted".to_string()));
        assert_eq!(faulted.status(), SessionStatus::InProgress);
        assert_eq!(faulted.outcome(), None);
        assert_eq!(faulted.version(), session.version());
    }

    fn fools_mate(rng: &mut ChaCha8Rng) -> GameSession<Chess> {
        let mut session = chess_game(rng);
        for (player, text) in [
            ("alice", "f2-f3"),
            ("bob", "e7-e5"),
            ("alice", "g2-g4"),
            ("bob", "d8-h4"),
        ] {
            session.submit(player, mv(text), rng).unwrap();
        }
        session
    }

    #[test]
    fn test_checkmate_record_restores_ended() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let session = fools_mate(&mut rng);
        let restored = GameSession::restore(Chess, session.record()).unwrap();
        assert_eq!(restored.status(), SessionStatus::Ended);
        assert_eq!(
            restored.outcome(),
            Some(Outcome::win(Color::Black, EndReason::Checkmate, 1))
        );
    }

    #[test]
    fn test_live_status_on_mated_board_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut record = fools_mate(&mut rng).record();
        record.status = SessionStatus::InProgress;
        record.outcome = None;
        let err = GameSession::restore(Chess, record).unwrap_err();
        assert!(matches!(err, SessionError::InvariantViolation(_)));
    }

    #[test]
    fn test_positional_outcome_on_live_board_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut session = chess_game(&mut rng);
        session.resign("bob").unwrap();
        let resigned = session.record();
        assert!(GameSession::restore(Chess, resigned.clone()).is_ok());

        let mut record = resigned;
        record.outcome = Some(Outcome::win(Color::White, EndReason::Checkmate, 1));
        assert!(GameSession::restore(Chess, record).is_err());
    }

    #[test]
    fn test_rematch_refused_after_departure() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut session = chess_game(&mut rng);
        assert!(!session.leave("bob").unwrap());
        assert_eq!(session.outcome().and_then(|o| o.winner()), Some(Color::White));
        assert!(matches!(
            session.request_rematch("alice", &mut rng),
            Err(SessionError::Forbidden(_))
        ));
        assert!(session.leave("alice").unwrap());
    }
}
