//! Analysis session records.
//!
//! A [`Session`] ties one user identity to the position currently on their
//! board. The store keys the record by [`SessionId`] and keeps a secondary
//! index from the lowercased username back to that id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::SessionId;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SessionStatus {
    /// The user is playing; position updates are analysed.
    #[default]
    Active,
    /// The game finished normally.
    Completed,
    /// The user walked away or the game was aborted.
    Abandoned,
}

/// A persisted analysis session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Session {
    /// Opaque unique identifier, also the broadcast group name.
    pub id: SessionId,
    /// User identity as supplied on creation. Indexed case-insensitively.
    pub username: String,
    /// Last position analysed for this session (empty until the first update).
    pub current_fen: String,
    /// Reference to the game on the hosting site, if known.
    pub game_id: Option<String>,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last written.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh active session for `username`.
    pub fn new(username: impl Into<String>, game_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            username: username.into(),
            current_fen: String::new(),
            game_id: game_id.filter(|g| !g.trim().is_empty()),
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// The secondary index key for this session's user identity.
    pub fn username_key(&self) -> String {
        normalize_username(&self.username)
    }

    /// Record a new board position and stamp `updated_at`.
    pub fn set_position(&mut self, fen: impl Into<String>) {
        self.current_fen = fen.into();
        self.touch();
    }

    /// Stamp `updated_at` with the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether the session still accepts position updates.
    pub const fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Active)
    }
}

/// Normalize a user identity for case-insensitive indexing.
pub fn normalize_username(username: &str) -> String {
    username.to_lowercase()
}
