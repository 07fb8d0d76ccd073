//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness and backend names |
//! | `POST` | `/api/v1/sessions` | Create (or return) the user's session |
//! | `GET` | `/api/v1/sessions/{id}` | Single session |
//! | `GET` | `/api/v1/sessions/user/{username}` | Session by username |
//! | `DELETE` | `/api/v1/sessions/{id}` | End a session |
//! | `POST` | `/api/v1/analysis/position` | Evaluate without broadcasting |
//! | `POST` | `/api/v1/analysis/session/{id}/analyse` | Evaluate and broadcast |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use gambit_core::EngineClient;
use gambit_db::SessionStore;
use gambit_types::{EvaluationResult, Session, SessionId};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body for `POST /api/v1/sessions`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Player whose board is being watched.
    #[serde(alias = "chessComUsername")]
    #[validate(length(min = 1, max = 64, message = "username is required"))]
    pub username: String,
    /// External game reference.
    #[serde(default)]
    pub game_id: Option<String>,
}

/// Body for `POST /api/v1/analysis/position`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyseRequest {
    /// Position to evaluate.
    #[validate(length(min = 1, message = "FEN string is required"))]
    pub fen: String,
    /// Search depth override.
    #[validate(range(min = 1, max = 30))]
    pub depth: Option<u32>,
    /// Number of alternative moves.
    #[validate(range(min = 1, max = 5))]
    pub top_moves: Option<u32>,
}

/// Body for `POST /api/v1/analysis/session/{id}/analyse`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFenRequest {
    /// The session's new position.
    #[validate(length(min = 1, message = "FEN string is required"))]
    pub fen: String,
    /// Search depth override.
    #[validate(range(min = 1, max = 30))]
    pub depth: Option<u32>,
    /// Number of alternative moves.
    #[validate(range(min = 1, max = 5))]
    pub top_moves: Option<u32>,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Session store backend name.
    pub store: &'static str,
    /// Engine client name.
    pub engine: &'static str,
    /// Live hub connections.
    pub connections: usize,
}

fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::Validation(format!("invalid session id {raw:?}: {e}")))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Report liveness and which backends are wired in.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        store: state.sessions().backend_name(),
        engine: state.orchestrator.engine().name(),
        connections: state.hub.connection_count(),
    })
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Create a session for a user, or return the one they already have.
///
/// Responds `201 Created` for a new session and `200 OK` when the user
/// already had one.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Session>>), ApiError> {
    body.validate()?;
    if body.username.trim().is_empty() {
        return Err(ApiError::Validation(String::from("username is required")));
    }

    let candidate = Session::new(body.username.trim(), body.game_id);
    let candidate_id = candidate.id;
    let session = state.sessions().create(candidate).await?;

    let status = if session.id == candidate_id {
        info!(session_id = %session.id, username = %session.username, "Session created");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::ok(session))))
}

/// Fetch a session by id.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Session>>, ApiError> {
    let id = parse_session_id(&id)?;
    state
        .sessions()
        .get_by_id(id)
        .await?
        .map(|s| Json(ApiResponse::ok(s)))
        .ok_or_else(|| ApiError::NotFound(String::from("Session not found")))
}

/// Fetch a user's session through the username index.
pub async fn get_session_by_username(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Session>>, ApiError> {
    state
        .sessions()
        .get_by_username(&username)
        .await?
        .map(|s| Json(ApiResponse::ok(s)))
        .ok_or_else(|| ApiError::NotFound(String::from("Session not found")))
}

/// End a session. Deleting an unknown session is not an error.
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_session_id(&id)?;
    state.sessions().delete(id).await?;
    info!(session_id = %id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Evaluate a position without touching sessions or broadcasting.
pub async fn analyse_position(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyseRequest>,
) -> Result<Json<ApiResponse<EvaluationResult>>, ApiError> {
    body.validate()?;
    let result = state
        .orchestrator
        .analyse_position(&body.fen, body.depth, body.top_moves)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// Run one update cycle: persist the position, evaluate it and broadcast
/// the suggestion to the session's group.
pub async fn analyse_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateFenRequest>,
) -> Result<Json<ApiResponse<EvaluationResult>>, ApiError> {
    let id = parse_session_id(&id)?;
    body.validate()?;
    let result = state
        .orchestrator
        .analyse_and_broadcast(id, &body.fen, body.depth, body.top_moves)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}
