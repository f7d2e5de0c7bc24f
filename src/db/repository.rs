//! Database repository for session snapshots and game results.

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::db::{GameResult, NewGameResult, PlayerRecord, SnapshotRow, schema};
use crate::notify::GameSummary;
use crate::store::{SnapshotStore, StoreError, StoredSession};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// SQLite-backed repository.
///
/// Holds one connection behind a mutex, so `":memory:"` databases work and
/// clones share the same database.
#[derive(Clone)]
pub struct GameRepository {
    db_path: String,
    conn: Arc<Mutex<SqliteConnection>>,
}

impl std::fmt::Debug for GameRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameRepository")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl GameRepository {
    /// Opens (creating if needed) the database at `db_path` and applies
    /// pending migrations.
    ///
    /// Use `":memory:"` for an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the connection or a migration fails.
    #[instrument(skip(db_path), fields(db_path = %db_path.as_ref()))]
    pub fn open(db_path: impl AsRef<str>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref().to_string();
        info!(path = %db_path, "Opening GameRepository");
        let mut conn = SqliteConnection::establish(&db_path)
            .map_err(|e| StoreError::new(format!("Failed to connect to '{}': {}", db_path, e)))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::new(format!("Migration failed: {}", e)))?;
        debug!(applied = applied.len(), "Migrations applied");
        Ok(Self {
            db_path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with the shared connection.
    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut SqliteConnection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::new("Connection lock poisoned"))?;
        f(&mut conn)
    }

    /// Records a finished game.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a database error occurs.
    #[instrument(skip(self, summary), fields(session_id = %summary.session_id(), reason = %summary.outcome().reason()))]
    pub fn record_result(&self, summary: &GameSummary) -> Result<GameResult, StoreError> {
        debug!("Recording game result");
        let row = NewGameResult::from_summary(summary);
        let result = self.with_conn(|conn| {
            Ok(diesel::insert_into(schema::game_results::table)
                .values(&row)
                .returning(GameResult::as_returning())
                .get_result(conn)?)
        })?;
        info!(result_id = result.id(), "Game result recorded");
        Ok(result)
    }

    /// Results of every game `player_id` played, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn results_for_player(&self, player_id: &str) -> Result<Vec<GameResult>, StoreError> {
        use schema::game_results::dsl;
        let results = self.with_conn(|conn| {
            Ok(dsl::game_results
                .filter(dsl::white_id.eq(player_id).or(dsl::black_id.eq(player_id)))
                .order(dsl::finished_at.desc())
                .select(GameResult::as_select())
                .load(conn)?)
        })?;
        debug!(count = results.len(), "Player results loaded");
        Ok(results)
    }

    /// Results recorded for one session (one per finished game, rematches
    /// included), oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn results_for_session(&self, session_id: &str) -> Result<Vec<GameResult>, StoreError> {
        use schema::game_results::dsl;
        self.with_conn(|conn| {
            Ok(dsl::game_results
                .filter(dsl::session_id.eq(session_id))
                .order(dsl::id.asc())
                .select(GameResult::as_select())
                .load(conn)?)
        })
    }

    /// Aggregated win/loss/draw record of `player_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn player_record(&self, player_id: &str) -> Result<PlayerRecord, StoreError> {
        let mut record = PlayerRecord::default();
        for result in self.results_for_player(player_id)? {
            match result.outcome_for(player_id) {
                Ok(Some(outcome)) => record.add(outcome, *result.points()),
                Ok(None) => {}
                Err(e) => warn!(result_id = result.id(), error = %e, "Skipping unreadable result"),
            }
        }
        info!(
            games = record.games(),
            wins = record.wins(),
            losses = record.losses(),
            draws = record.draws(),
            win_rate = %format!("{:.1}%", record.win_rate()),
            "Player record computed"
        );
        Ok(record)
    }
}

impl SnapshotStore for GameRepository {
    #[instrument(skip(self, snapshot), fields(session_id = %snapshot.id(), version = snapshot.version()))]
    fn save_snapshot(&self, snapshot: &StoredSession) -> Result<(), StoreError> {
        use schema::session_snapshots::dsl;
        let row = SnapshotRow::from_stored(snapshot)?;
        self.with_conn(|conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let stored: Option<i64> = dsl::session_snapshots
                    .filter(dsl::id.eq(row.id()))
                    .select(dsl::version)
                    .first(conn)
                    .optional()?;
                if stored.is_some_and(|v| v > *row.version()) {
                    debug!(stored = ?stored, "Newer snapshot already stored");
                    return Ok(());
                }
                diesel::replace_into(dsl::session_snapshots)
                    .values(&row)
                    .execute(conn)?;
                Ok(())
            })
        })
    }

    #[instrument(skip(self))]
    fn load_snapshot(&self, id: &str) -> Result<Option<StoredSession>, StoreError> {
        use schema::session_snapshots::dsl;
        let row = self.with_conn(|conn| {
            Ok(dsl::session_snapshots
                .filter(dsl::id.eq(id))
                .select(SnapshotRow::as_select())
                .first(conn)
                .optional()?)
        })?;
        row.map(SnapshotRow::into_stored).transpose()
    }

    #[instrument(skip(self))]
    fn delete_snapshot(&self, id: &str) -> Result<(), StoreError> {
        use schema::session_snapshots::dsl;
        let deleted = self.with_conn(|conn| {
            Ok(diesel::delete(dsl::session_snapshots.filter(dsl::id.eq(id))).execute(conn)?)
        })?;
        debug!(deleted, "Snapshot deleted");
        Ok(())
    }
}
