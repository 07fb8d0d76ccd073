//! [`SessionStore`] backed by `Dragonfly`/Redis.
//!
//! Creation claims the username index with `SET NX` first, so two creates
//! for the same user cannot both produce a record. If the claim fails but
//! the index points at a record that has already expired, the stale entry
//! is taken over.

use std::time::Duration;

use gambit_types::{Session, SessionId, normalize_username};
use tracing::{debug, info, warn};

use crate::dragonfly::DragonflyPool;
use crate::error::DbError;
use crate::store::{SessionStore, StoreConfig, session_key, username_key};

/// Session store over a [`DragonflyPool`].
#[derive(Clone)]
pub struct DragonflySessionStore {
    pool: DragonflyPool,
    config: StoreConfig,
}

impl DragonflySessionStore {
    /// Wrap an existing pool.
    pub const fn new(pool: DragonflyPool, config: StoreConfig) -> Self {
        Self { pool, config }
    }

    /// Connect to `url` and build a store.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the URL is invalid or the connection fails.
    pub async fn connect(url: &str, config: StoreConfig) -> Result<Self, DbError> {
        let pool = DragonflyPool::connect(url).await?;
        Ok(Self::new(pool, config))
    }

    /// The underlying pool.
    pub const fn pool(&self) -> &DragonflyPool {
        &self.pool
    }
}

impl SessionStore for DragonflySessionStore {
    async fn create(&self, session: Session) -> Result<Session, DbError> {
        let ttl = self.config.ttl_secs();
        let index_key = username_key(&session.username_key());
        let id = session.id.to_string();

        let claimed = self.pool.set_nx_ex(&index_key, &id, ttl).await?;
        if !claimed {
            if let Some(existing) = self.get_by_username(&session.username).await? {
                debug!(session_id = %existing.id, username = %existing.username, "Session already exists");
                return Ok(existing);
            }
            warn!(username = %session.username, "Username index points at a missing session, replacing it");
        }

        self.pool
            .set_pair_ex(&session_key(session.id), &session, &index_key, &id, ttl)
            .await?;

        info!(session_id = %session.id, username = %session.username, "Created session");
        Ok(session)
    }

    async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, DbError> {
        self.pool.get_json(&session_key(id)).await
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Session>, DbError> {
        let key = username_key(&normalize_username(username));
        let Some(raw) = self.pool.get_string(&key).await? else {
            return Ok(None);
        };
        let id: SessionId = raw.parse().map_err(|e| DbError::Corrupt {
            key,
            reason: format!("invalid session id {raw:?}: {e}"),
        })?;
        self.get_by_id(id).await
    }

    async fn update(&self, mut session: Session) -> Result<Session, DbError> {
        session.touch();
        let ttl = self.config.ttl_secs();
        self.pool
            .set_json_ex(&session_key(session.id), &session, ttl)
            .await?;

        if self.config.refresh_index_on_update {
            let index_key = username_key(&session.username_key());
            let owner = session.id.to_string();
            if !self.pool.expire_owned_index(&index_key, &owner, ttl).await? {
                debug!(session_id = %session.id, "Username index expired or reassigned, not refreshed");
            }
        }

        Ok(session)
    }

    async fn delete(&self, id: SessionId) -> Result<(), DbError> {
        let Some(session) = self.get_by_id(id).await? else {
            return Ok(());
        };

        let index_removed = self
            .pool
            .delete_with_owned_index(
                &session_key(id),
                &username_key(&session.username_key()),
                &id.to_string(),
            )
            .await?;
        info!(session_id = %id, index_removed, "Deleted session");
        Ok(())
    }

    async fn remaining_ttl(&self, id: SessionId) -> Result<Option<Duration>, DbError> {
        self.pool.ttl(&session_key(id)).await
    }

    fn backend_name(&self) -> &'static str {
        "dragonfly"
    }
}
