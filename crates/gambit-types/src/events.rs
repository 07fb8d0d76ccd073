//! Wire events exchanged over the suggestion hub `WebSocket`.
//!
//! Every frame is a JSON text frame of the form
//! `{"event": "<kebab-case-name>", "data": {...}}`.
//!
//! | Direction | Event | Payload |
//! |-----------|-------|---------|
//! | client -> server | `join-session` | `{sessionId}` |
//! | client -> server | `position-update` | `{sessionId, fen}` |
//! | server -> caller | `joined-session` | `{sessionId, message}` |
//! | server -> group | `analysis-started` | `{fen}` |
//! | server -> group | `suggestion` | [`EvaluationResult`] |
//! | server -> caller | `error` | `{message}` |
//!
//! Broadcasts for one group are not ordered relative to each other: a slow
//! evaluation of an older position can arrive after a newer one.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::evaluation::EvaluationResult;
use crate::ids::SessionId;

/// Frames a watcher sends to the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum ClientEvent {
    /// Join the broadcast group for a session.
    #[serde(rename_all = "camelCase")]
    JoinSession {
        /// Session (and group) to join.
        session_id: SessionId,
    },
    /// Announce a new board position to the session group.
    #[serde(rename_all = "camelCase")]
    PositionUpdate {
        /// Session the position belongs to.
        session_id: SessionId,
        /// The new position.
        fen: String,
    },
}

/// Frames the hub sends to watchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum ServerEvent {
    /// Private acknowledgement of a `join-session`.
    #[serde(rename_all = "camelCase")]
    JoinedSession {
        /// The group that was joined.
        session_id: SessionId,
        /// Human-readable greeting.
        message: String,
    },
    /// A position was received and is being evaluated.
    AnalysisStarted {
        /// The position under evaluation.
        fen: String,
    },
    /// A finished evaluation.
    Suggestion(EvaluationResult),
    /// The last client frame could not be handled.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl ServerEvent {
    /// The wire name of this event, for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::JoinedSession { .. } => "joined-session",
            Self::AnalysisStarted { .. } => "analysis-started",
            Self::Suggestion(_) => "suggestion",
            Self::Error { .. } => "error",
        }
    }
}
