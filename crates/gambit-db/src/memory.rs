//! In-process [`SessionStore`] for development and tests.
//!
//! Expiry is measured on the tokio clock, so tests can pause time and
//! advance it past the TTL. Expired entries are dropped on access, and
//! every write sweeps both maps so abandoned sessions do not accumulate.
//! The primary map and the username index expire independently, exactly
//! like the two Redis keys they stand in for.

use std::collections::HashMap;
use std::time::Duration;

use gambit_types::{Session, SessionId, normalize_username};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::DbError;
use crate::store::{SessionStore, StoreConfig};

/// A value with an absolute expiry.
#[derive(Debug, Clone)]
struct Expiring<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Expiring<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: deadline(ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

fn deadline(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl).unwrap_or(now)
}

#[derive(Debug, Default)]
struct Tables {
    sessions: HashMap<SessionId, Expiring<Session>>,
    usernames: HashMap<String, Expiring<SessionId>>,
}

impl Tables {
    fn live_session(&mut self, id: SessionId, now: Instant) -> Option<&Expiring<Session>> {
        if self.sessions.get(&id).is_some_and(|e| !e.is_live(now)) {
            self.sessions.remove(&id);
        }
        self.sessions.get(&id)
    }

    fn live_index(&mut self, key: &str, now: Instant) -> Option<SessionId> {
        if self.usernames.get(key).is_some_and(|e| !e.is_live(now)) {
            self.usernames.remove(key);
        }
        self.usernames.get(key).map(|e| e.value)
    }

    fn purge_expired(&mut self, now: Instant) {
        let before = self.sessions.len().saturating_add(self.usernames.len());
        self.sessions.retain(|_, e| e.is_live(now));
        self.usernames.retain(|_, e| e.is_live(now));
        let purged = before.saturating_sub(self.sessions.len().saturating_add(self.usernames.len()));
        if purged > 0 {
            debug!(purged, "Swept expired entries");
        }
    }
}

/// Session store held in process memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    tables: RwLock<Tables>,
    config: StoreConfig,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            config,
        }
    }

    /// Number of live username index entries. Test and diagnostics aid.
    pub async fn index_len(&self) -> usize {
        let now = Instant::now();
        let tables = self.tables.read().await;
        tables.usernames.values().filter(|e| e.is_live(now)).count()
    }

    /// Remaining TTL of the username index entry for `username`.
    pub async fn index_ttl(&self, username: &str) -> Option<Duration> {
        let now = Instant::now();
        let tables = self.tables.read().await;
        tables
            .usernames
            .get(&normalize_username(username))
            .filter(|e| e.is_live(now))
            .map(|e| e.expires_at.saturating_duration_since(now))
    }
}

impl SessionStore for MemorySessionStore {
    async fn create(&self, session: Session) -> Result<Session, DbError> {
        let now = Instant::now();
        let key = session.username_key();
        let mut tables = self.tables.write().await;
        tables.purge_expired(now);

        if let Some(existing_id) = tables.live_index(&key, now)
            && let Some(existing) = tables.live_session(existing_id, now)
        {
            debug!(session_id = %existing_id, "Session already exists");
            return Ok(existing.value.clone());
        }

        tables
            .usernames
            .insert(key, Expiring::new(session.id, self.config.ttl));
        tables
            .sessions
            .insert(session.id, Expiring::new(session.clone(), self.config.ttl));

        info!(session_id = %session.id, username = %session.username, "Created session");
        Ok(session)
    }

    async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, DbError> {
        let now = Instant::now();
        let mut tables = self.tables.write().await;
        Ok(tables.live_session(id, now).map(|e| e.value.clone()))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Session>, DbError> {
        let now = Instant::now();
        let mut tables = self.tables.write().await;
        let Some(id) = tables.live_index(&normalize_username(username), now) else {
            return Ok(None);
        };
        Ok(tables.live_session(id, now).map(|e| e.value.clone()))
    }

    async fn update(&self, mut session: Session) -> Result<Session, DbError> {
        session.touch();
        let now = Instant::now();
        let ttl = self.config.ttl;
        let mut tables = self.tables.write().await;
        tables.purge_expired(now);

        if self.config.refresh_index_on_update {
            let key = session.username_key();
            if tables.live_index(&key, now) == Some(session.id)
                && let Some(entry) = tables.usernames.get_mut(&key)
            {
                entry.expires_at = deadline(ttl);
            }
        }

        tables
            .sessions
            .insert(session.id, Expiring::new(session.clone(), ttl));
        Ok(session)
    }

    async fn delete(&self, id: SessionId) -> Result<(), DbError> {
        let now = Instant::now();
        let mut tables = self.tables.write().await;
        let Some(entry) = tables.live_session(id, now) else {
            return Ok(());
        };
        let key = entry.value.username_key();
        tables.sessions.remove(&id);
        // The index may already belong to a newer session for this user.
        if tables.live_index(&key, now) == Some(id) {
            tables.usernames.remove(&key);
        }
        info!(session_id = %id, "Deleted session");
        Ok(())
    }

    async fn remaining_ttl(&self, id: SessionId) -> Result<Option<Duration>, DbError> {
        let now = Instant::now();
        let mut tables = self.tables.write().await;
        Ok(tables
            .live_session(id, now)
            .map(|e| e.expires_at.saturating_duration_since(now)))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
