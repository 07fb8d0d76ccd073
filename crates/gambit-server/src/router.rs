//! Axum router construction.
//!
//! Assembles the REST endpoints and the hub `WebSocket` into a single
//! [`Router`] with CORS enabled, since the watcher runs inside another
//! site's page.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health` -- liveness and backend names
/// - `GET /hubs/chess` -- suggestion hub `WebSocket`
/// - `POST /api/v1/sessions` -- create or return a session
/// - `GET /api/v1/sessions/{id}` -- single session
/// - `DELETE /api/v1/sessions/{id}` -- end a session
/// - `GET /api/v1/sessions/user/{username}` -- session by username
/// - `POST /api/v1/analysis/position` -- evaluate only
/// - `POST /api/v1/analysis/session/{id}/analyse` -- evaluate and broadcast
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // WebSocket
        .route("/hubs/chess", get(ws::ws_hub))
        // Sessions
        .route("/api/v1/sessions", post(handlers::create_session))
        .route(
            "/api/v1/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route(
            "/api/v1/sessions/user/{username}",
            get(handlers::get_session_by_username),
        )
        // Analysis
        .route("/api/v1/analysis/position", post(handlers::analyse_position))
        .route(
            "/api/v1/analysis/session/{id}/analyse",
            post(handlers::analyse_session),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
