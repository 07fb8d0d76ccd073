//! Runtime choice between the session store backends.
//!
//! Uses enum dispatch instead of trait objects because the async
//! [`SessionStore`] methods are not dyn-compatible.

use std::time::Duration;

use gambit_types::{Session, SessionId};

use crate::error::DbError;
use crate::memory::MemorySessionStore;
use crate::redis_store::DragonflySessionStore;
use crate::store::{SessionStore, StoreConfig};

/// The session store selected at startup.
pub enum SessionBackend {
    /// `Dragonfly`/Redis, used whenever a store URL is configured.
    Dragonfly(DragonflySessionStore),
    /// In-process store for local runs without Redis.
    Memory(MemorySessionStore),
}

impl SessionBackend {
    /// Connect to `url` if given, otherwise fall back to memory.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a URL is given and the connection fails.
    pub async fn from_url(url: Option<&str>, config: StoreConfig) -> Result<Self, DbError> {
        match url {
            Some(url) => Ok(Self::Dragonfly(
                DragonflySessionStore::connect(url, config).await?,
            )),
            None => {
                tracing::warn!("No store URL configured, sessions are kept in memory");
                Ok(Self::Memory(MemorySessionStore::new(config)))
            }
        }
    }
}

impl SessionStore for SessionBackend {
    async fn create(&self, session: Session) -> Result<Session, DbError> {
        match self {
            Self::Dragonfly(store) => store.create(session).await,
            Self::Memory(store) => store.create(session).await,
        }
    }

    async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, DbError> {
        match self {
            Self::Dragonfly(store) => store.get_by_id(id).await,
            Self::Memory(store) => store.get_by_id(id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Session>, DbError> {
        match self {
            Self::Dragonfly(store) => store.get_by_username(username).await,
            Self::Memory(store) => store.get_by_username(username).await,
        }
    }

    async fn update(&self, session: Session) -> Result<Session, DbError> {
        match self {
            Self::Dragonfly(store) => store.update(session).await,
            Self::Memory(store) => store.update(session).await,
        }
    }

    async fn delete(&self, id: SessionId) -> Result<(), DbError> {
        match self {
            Self::Dragonfly(store) => store.delete(id).await,
            Self::Memory(store) => store.delete(id).await,
        }
    }

    async fn remaining_ttl(&self, id: SessionId) -> Result<Option<Duration>, DbError> {
        match self {
            Self::Dragonfly(store) => store.remaining_ttl(id).await,
            Self::Memory(store) => store.remaining_ttl(id).await,
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            Self::Dragonfly(store) => store.backend_name(),
            Self::Memory(store) => store.backend_name(),
        }
    }
}
