//! Watcher-to-API tests against an in-process server.
//!
//! Each test binds the real router on an ephemeral port with the in-memory
//! store and the stub engine.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use gambit_core::{AnalysisConfig, EngineBackend, MissingSessionPolicy, StubEngine};
use gambit_db::{MemorySessionStore, SessionBackend, SessionStore, StoreConfig};
use gambit_server::{AppState, build_router};
use gambit_types::SessionId;
use gambit_watcher::{
    AnalysisClient, ClientError, ExtractedPosition, PositionSource, SessionContext,
    WatcherSettings, forward_changes,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";

async fn spawn_server(policy: MissingSessionPolicy) -> (String, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        SessionBackend::Memory(MemorySessionStore::new(StoreConfig::default())),
        EngineBackend::Stub(StubEngine::new()),
        AnalysisConfig {
            engine_timeout: Duration::from_secs(30),
            missing_session: policy,
        },
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(Arc::clone(&state));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

fn client(base_url: &str) -> AnalysisClient {
    AnalysisClient::new(base_url, Duration::from_secs(5)).unwrap()
}

fn settings(base_url: &str, username: &str) -> WatcherSettings {
    WatcherSettings {
        api_base_url: base_url.to_owned(),
        username: username.to_owned(),
        ..WatcherSettings::default()
    }
}

fn position(fen: &str) -> ExtractedPosition {
    ExtractedPosition {
        fen: fen.to_owned(),
        source: PositionSource::Attribute,
    }
}

#[tokio::test]
async fn test_client_round_trip() {
    let (base, _state) = spawn_server(MissingSessionPolicy::Tolerate).await;
    let client = client(&base);

    assert!(client.health_check().await);

    let session = client.create_session("dave", Some("g-7")).await.unwrap();
    assert_eq!(session.username, "dave");
    assert_eq!(session.game_id.as_deref(), Some("g-7"));

    let again = client.create_session("DAVE", None).await.unwrap();
    assert_eq!(again.id, session.id);

    let result = client
        .analyse_session(session.id, START, None, None)
        .await
        .unwrap();
    assert_eq!(result.fen, START);
    assert_eq!(result.best_move.uci, "e2e4");

    let result = client.analyse_position(AFTER_E4, 8, 2).await.unwrap();
    assert_eq!(result.best_move.depth, 8);
}

#[tokio::test]
async fn test_client_surfaces_server_errors() {
    let (base, _state) = spawn_server(MissingSessionPolicy::Abort).await;
    let client = client(&base);

    let err = client.create_session("  ", None).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 400, .. }));

    let err = client
        .analyse_session(SessionId::new(), START, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 404, ref message } if message.starts_with("session ")));
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    let client = client("http://127.0.0.1:9");
    assert!(!client.health_check().await);
    let err = client.create_session("erin", None).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn test_ensure_session_reuses_known_id() {
    let (base, state) = spawn_server(MissingSessionPolicy::Tolerate).await;
    let mut ctx = SessionContext::new(settings(&base, "frank"), client(&base));

    let first = ctx.ensure_session().await.unwrap().unwrap();
    let second = ctx.ensure_session().await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(ctx.session_id(), Some(first));

    let stored = state.sessions().get_by_username("frank").await.unwrap();
    assert_eq!(stored.map(|s| s.id), Some(first));
}

#[tokio::test]
async fn test_not_ready_sends_nothing() {
    let (base, _state) = spawn_server(MissingSessionPolicy::Tolerate).await;
    let mut ctx = SessionContext::new(settings(&base, ""), client(&base));

    assert_eq!(ctx.ensure_session().await.unwrap(), None);
    assert!(ctx.submit(START).await.unwrap().is_none());
}

#[tokio::test]
async fn test_switching_user_drops_session() {
    let (base, _state) = spawn_server(MissingSessionPolicy::Tolerate).await;
    let mut ctx = SessionContext::new(settings(&base, "gina"), client(&base));
    let first = ctx.ensure_session().await.unwrap();

    ctx.update_settings(settings(&base, "GINA"));
    assert_eq!(ctx.session_id(), first);

    ctx.update_settings(settings(&base, "hank"));
    assert_eq!(ctx.session_id(), None);
}

#[tokio::test]
async fn test_queued_changes_are_coalesced() {
    let (base, state) = spawn_server(MissingSessionPolicy::Tolerate).await;
    let mut ctx = SessionContext::new(settings(&base, "ivy"), client(&base));

    let (tx, rx) = mpsc::channel(8);
    for fen in [START, AFTER_E4, AFTER_E5] {
        tx.send(position(fen)).await.unwrap();
    }
    drop(tx);

    let mut results = Vec::new();
    forward_changes(&mut ctx, rx, |result| results.push(result.fen)).await;

    assert_eq!(results, vec![AFTER_E5]);
    let session = state
        .sessions()
        .get_by_username("ivy")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.current_fen, AFTER_E5);
}

#[tokio::test]
async fn test_submit_sends_configured_depth() {
    let (base, _state) = spawn_server(MissingSessionPolicy::Tolerate).await;
    let settings = WatcherSettings {
        analysis_depth: 14,
        top_moves_count: 2,
        ..settings(&base, "judy")
    };
    let mut ctx = SessionContext::new(settings, client(&base));

    let result = ctx.submit(START).await.unwrap().unwrap();
    assert_eq!(result.best_move.depth, 14);
}

#[tokio::test]
async fn test_get_session_reports_missing() {
    let (base, state) = spawn_server(MissingSessionPolicy::Tolerate).await;
    let client = client(&base);
    let session = client.create_session("kim", None).await.unwrap();

    let found = client.get_session(session.id).await.unwrap();
    assert_eq!(found.map(|s| s.id), Some(session.id));

    state.sessions().delete(session.id).await.unwrap();
    assert!(client.get_session(session.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_session_is_replaced_under_tolerant_server() {
    let (base, state) = spawn_server(MissingSessionPolicy::Tolerate).await;
    let mut ctx = SessionContext::new(settings(&base, "lena"), client(&base))
        .with_recheck_interval(Duration::ZERO);
    let first = ctx.ensure_session().await.unwrap().unwrap();

    // The server forgets the session but keeps answering analyse calls.
    state.sessions().delete(first).await.unwrap();

    ctx.submit(AFTER_E4).await.unwrap().unwrap();
    let second = ctx.session_id().unwrap();
    assert_ne!(first, second);

    let stored = state.sessions().get_by_id(second).await.unwrap().unwrap();
    assert_eq!(stored.current_fen, AFTER_E4);
}

#[tokio::test]
async fn test_known_session_is_trusted_within_recheck_interval() {
    let (base, state) = spawn_server(MissingSessionPolicy::Tolerate).await;
    let mut ctx = SessionContext::new(settings(&base, "mona"), client(&base));
    let first = ctx.ensure_session().await.unwrap().unwrap();

    state.sessions().delete(first).await.unwrap();

    assert_eq!(ctx.ensure_session().await.unwrap(), Some(first));
}
