//! The [`SessionStore`] contract shared by every backend.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `gambit:session:{id}` | JSON | Full [`Session`] record |
//! | `gambit:username:{username}` | String | Session id for a lowercased user identity |
//!
//! Both keys carry the same sliding expiry. Writes are last-write-wins;
//! there is no version check between concurrent updates of one session.

use std::future::Future;
use std::time::Duration;

use gambit_types::{Session, SessionId};

use crate::error::DbError;

/// Default idle window after which an untouched session expires.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Prefix for primary session records.
const SESSION_KEY_PREFIX: &str = "gambit:session:";

/// Prefix for the username secondary index.
const USERNAME_KEY_PREFIX: &str = "gambit:username:";

/// Primary record key for a session.
pub fn session_key(id: SessionId) -> String {
    format!("{SESSION_KEY_PREFIX}{id}")
}

/// Secondary index key for an already-normalized username.
pub fn username_key(normalized: &str) -> String {
    format!("{USERNAME_KEY_PREFIX}{normalized}")
}

/// Expiry behaviour shared by all backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Sliding expiry applied on every write.
    pub ttl: Duration,
    /// Whether `update` also resets the username index expiry. When off,
    /// the index keeps the expiry it got at creation and can lapse before
    /// the record it points to.
    pub refresh_index_on_update: bool,
}

impl StoreConfig {
    /// The TTL in whole seconds, as Redis expects it.
    pub fn ttl_secs(&self) -> i64 {
        i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_SESSION_TTL,
            refresh_index_on_update: true,
        }
    }
}

/// Keyed storage for [`Session`] records with a username index.
///
/// Implementations own their records exclusively. Every method is a
/// single round of reads and writes against the backing store; there is
/// no cross-call locking.
pub trait SessionStore: Send + Sync {
    /// Store a new session, or return the existing one for the same user.
    ///
    /// Idempotent with respect to the case-insensitive username: if a live
    /// session is reachable through the index, it is returned unchanged
    /// and `session` is discarded.
    fn create(&self, session: Session) -> impl Future<Output = Result<Session, DbError>> + Send;

    /// Load a session by id. `Ok(None)` if absent or expired.
    fn get_by_id(
        &self,
        id: SessionId,
    ) -> impl Future<Output = Result<Option<Session>, DbError>> + Send;

    /// Resolve a username through the index and load its session.
    ///
    /// Returns `Ok(None)` when the index entry is missing, or when it
    /// points at a record that no longer exists.
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<Session>, DbError>> + Send;

    /// Rewrite a session record, stamping `updated_at` and resetting its
    /// expiry. Returns the record as written.
    fn update(&self, session: Session) -> impl Future<Output = Result<Session, DbError>> + Send;

    /// Remove a session and its index entry. No-op if absent.
    fn delete(&self, id: SessionId) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Remaining time-to-live of a session record, `None` if absent.
    fn remaining_ttl(
        &self,
        id: SessionId,
    ) -> impl Future<Output = Result<Option<Duration>, DbError>> + Send;

    /// Short backend name for health output and logs.
    fn backend_name(&self) -> &'static str;
}
