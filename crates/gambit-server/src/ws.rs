//! `WebSocket` endpoint for the suggestion hub.
//!
//! Clients connect to `GET /hubs/chess`, send `join-session` to enter a
//! session group and then receive every event published to that group.
//! `position-update` frames are relayed to the group as `analysis-started`;
//! they do not start an evaluation themselves (the REST analyse endpoint
//! does).
//!
//! Each socket task drains its own outbound queue from the hub, so a slow
//! client never stalls a broadcast.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use gambit_types::{ClientEvent, ConnectionId, ServerEvent};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a hub connection.
///
/// # Route
///
/// `GET /hubs/chess`
pub async fn ws_hub(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Pump frames both ways until either side goes away.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let (connection_id, mut outbound) = state.hub.connect().await;

    loop {
        tokio::select! {
            // Frames queued for this connection by the hub.
            queued = outbound.recv() => {
                let Some(frame) = queued else {
                    debug!(connection_id = %connection_id, "Hub dropped connection");
                    break;
                };
                if socket.send(Message::Text(frame.as_str().into())).await.is_err() {
                    debug!(connection_id = %connection_id, "WebSocket client disconnected (send failed)");
                    break;
                }
            }
            // Frames from the client.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_frame(&state, connection_id, text.as_str()).await {
                            let Ok(json) = serde_json::to_string(&reply) else { continue };
                            if socket.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(connection_id = %connection_id, "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(connection_id = %connection_id, "WebSocket client closed");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(connection_id = %connection_id, "WebSocket error: {e}");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary and pong frames carry nothing for the hub.
                    }
                }
            }
        }
    }

    state.hub.disconnect(connection_id).await;
}

/// Apply one client frame. Returns a reply for the caller only, if any.
pub async fn handle_frame(
    state: &AppState,
    connection_id: ConnectionId,
    raw: &str,
) -> Option<ServerEvent> {
    match serde_json::from_str::<ClientEvent>(raw) {
        Ok(ClientEvent::JoinSession { session_id }) => {
            state.hub.join(connection_id, session_id).await;
            None
        }
        Ok(ClientEvent::PositionUpdate { session_id, fen }) => {
            info!(connection_id = %connection_id, session_id = %session_id, fen = %fen, "Position update");
            state
                .hub
                .notify(session_id, &ServerEvent::AnalysisStarted { fen })
                .await;
            None
        }
        Err(e) => {
            warn!(connection_id = %connection_id, error = %e, "Unrecognised client frame");
            Some(ServerEvent::Error {
                message: format!("unrecognised frame: {e}"),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gambit_core::{AnalysisConfig, EngineBackend, StubEngine};
    use gambit_db::{MemorySessionStore, SessionBackend, StoreConfig};
    use gambit_types::SessionId;

    use super::*;

    fn state() -> AppState {
        AppState::new(
            SessionBackend::Memory(MemorySessionStore::new(StoreConfig::default())),
            EngineBackend::Stub(StubEngine::new()),
            AnalysisConfig::default(),
        )
    }

    #[tokio::test]
    async fn join_frame_enters_group() {
        let state = state();
        let session = SessionId::new();
        let (id, mut rx) = state.hub.connect().await;

        let raw = format!(r#"{{"event":"join-session","data":{{"sessionId":"{session}"}}}}"#);
        let reply = handle_frame(&state, id, &raw).await;

        assert!(reply.is_none());
        assert_eq!(state.hub.group_size(session).await, 1);
        let ack: ServerEvent = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(ack.name(), "joined-session");
    }

    #[tokio::test]
    async fn position_update_announces_to_group() {
        let state = state();
        let session = SessionId::new();
        let (sender, _rx_sender) = state.hub.connect().await;
        let (watcher, mut rx_watcher) = state.hub.connect().await;
        state.hub.join(watcher, session).await;
        let _ack = rx_watcher.try_recv().unwrap();

        let raw = format!(
            r#"{{"event":"position-update","data":{{"sessionId":"{session}","fen":"8/8/8/8/8/8/8/8 w - - 0 1"}}}}"#
        );
        let reply = handle_frame(&state, sender, &raw).await;

        assert!(reply.is_none());
        let event: ServerEvent = serde_json::from_str(&rx_watcher.try_recv().unwrap()).unwrap();
        assert_eq!(
            event,
            ServerEvent::AnalysisStarted {
                fen: String::from("8/8/8/8/8/8/8/8 w - - 0 1")
            }
        );
    }

    #[tokio::test]
    async fn malformed_frame_gets_error_reply() {
        let state = state();
        let (id, _rx) = state.hub.connect().await;

        let reply = handle_frame(&state, id, "{not json").await;

        assert!(matches!(reply, Some(ServerEvent::Error { .. })));
    }
}
