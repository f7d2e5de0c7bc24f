//! HTTP adapter over [`GameService`].
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST | `/sessions` | create a session |
//! | GET | `/sessions` | list loaded sessions |
//! | GET | `/sessions/{id}` | current snapshot |
//! | POST | `/sessions/{id}/join` | take a seat |
//! | POST | `/sessions/{id}/moves` | submit a move |
//! | POST | `/sessions/{id}/resign` | resign |
//! | POST | `/sessions/{id}/rematch` | vote for a rematch |
//! | POST | `/sessions/{id}/leave` | leave the session |
//!
//! Service calls lock std mutexes and may touch SQLite, so every handler
//! runs them on the blocking pool.

use crate::error::SessionError;
use crate::service::{GameService, Receipt};
use crate::session::{Player, SessionId};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strictly_rules::GameKind;
use tracing::{error, warn};

/// Builds the router.
pub fn router(service: GameService) -> Router {
    Router::new()
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", get(get_state))
        .route("/sessions/{id}/join", post(join_session))
        .route("/sessions/{id}/moves", post(submit_move))
        .route("/sessions/{id}/resign", post(resign))
        .route("/sessions/{id}/rematch", post(request_rematch))
        .route("/sessions/{id}/leave", post(leave))
        .with_state(service)
}

// ── Request types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CreateRequest {
    kind: GameKind,
    player: Player,
    #[serde(default)]
    session_id: Option<SessionId>,
}

#[derive(Debug, Deserialize)]
struct JoinRequest {
    player: Player,
}

#[derive(Debug, Deserialize)]
struct MoveRequest {
    player_id: String,
    #[serde(rename = "move")]
    mv: Value,
}

#[derive(Debug, Deserialize)]
struct PlayerRequest {
    player_id: String,
}

// ── Errors ──────────────────────────────────────────────────────────

/// A refused request.
#[derive(Debug)]
pub struct ApiError(SessionError);

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self(err)
    }
}

/// HTTP status for a session error.
pub fn status_for(err: &SessionError) -> StatusCode {
    match err {
        SessionError::IllegalMove(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::Forbidden(_) => StatusCode::FORBIDDEN,
        SessionError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        SessionError::SessionFull(_)
        | SessionError::SessionEnded(_)
        | SessionError::NotStarted(_)
        | SessionError::SessionExists(_) => StatusCode::CONFLICT,
        SessionError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = match &self.0 {
            SessionError::InvariantViolation(detail) => {
                error!(%detail, "Internal error served as 500");
                "Internal error".to_string()
            }
            other => {
                warn!(error = %other, "Request refused");
                other.to_string()
            }
        };
        (
            status,
            Json(json!({ "error": message, "kind": self.0.kind() })),
        )
            .into_response()
    }
}

/// Runs a service call on the blocking pool.
async fn blocking<T, F>(service: GameService, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&GameService) -> Result<T, SessionError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|e| ApiError(SessionError::InvariantViolation(format!("Handler task failed: {}", e))))?
        .map_err(ApiError)
}

fn receipt_body<T: Serialize>(receipt: &Receipt<T>) -> Json<Value> {
    Json(json!({
        "value": receipt.value(),
        "snapshot": &**receipt.snapshot(),
        "durability": receipt.durability(),
    }))
}

// ── Handlers ────────────────────────────────────────────────────────

async fn create_session(
    State(service): State<GameService>,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let receipt = blocking(service, move |s| {
        s.create_session(req.kind, req.player, req.session_id)
    })
    .await?;
    Ok((StatusCode::CREATED, receipt_body(&receipt)))
}

async fn list_sessions(State(service): State<GameService>) -> Result<Json<Value>, ApiError> {
    let sessions = blocking(service, |s| s.list_sessions()).await?;
    let sessions: Vec<_> = sessions.iter().map(|s| &**s).collect();
    Ok(Json(json!({ "sessions": sessions })))
}

async fn get_state(
    State(service): State<GameService>,
    Path(id): Path<SessionId>,
) -> Result<Json<Value>, ApiError> {
    let snapshot = blocking(service, move |s| s.get_state(&id)).await?;
    Ok(Json(json!(&*snapshot)))
}

async fn join_session(
    State(service): State<GameService>,
    Path(id): Path<SessionId>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<Value>, ApiError> {
    let receipt = blocking(service, move |s| s.join_session(&id, req.player)).await?;
    Ok(receipt_body(&receipt))
}

async fn submit_move(
    State(service): State<GameService>,
    Path(id): Path<SessionId>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<Value>, ApiError> {
    let receipt = blocking(service, move |s| s.submit_move(&id, &req.player_id, req.mv)).await?;
    Ok(receipt_body(&receipt))
}

async fn resign(
    State(service): State<GameService>,
    Path(id): Path<SessionId>,
    Json(req): Json<PlayerRequest>,
) -> Result<Json<Value>, ApiError> {
    let receipt = blocking(service, move |s| s.resign(&id, &req.player_id)).await?;
    Ok(receipt_body(&receipt))
}

async fn request_rematch(
    State(service): State<GameService>,
    Path(id): Path<SessionId>,
    Json(req): Json<PlayerRequest>,
) -> Result<Json<Value>, ApiError> {
    let receipt = blocking(service, move |s| s.request_rematch(&id, &req.player_id)).await?;
    Ok(receipt_body(&receipt))
}

async fn leave(
    State(service): State<GameService>,
    Path(id): Path<SessionId>,
    Json(req): Json<PlayerRequest>,
) -> Result<Json<Value>, ApiError> {
    let receipt = blocking(service, move |s| s.leave(&id, &req.player_id)).await?;
    Ok(receipt_body(&receipt))
}
