//! Session store for the Gambit suggestion pipeline.
//!
//! Sessions live in `Dragonfly` (Redis-compatible) with a sliding expiry;
//! a second key maps each lowercased username to its session id so the
//! watcher can find its session again after a restart.
//!
//! ```text
//! SessionStore (trait)
//!     |
//!     +-- DragonflySessionStore --> DragonflyPool --> Dragonfly
//!     +-- MemorySessionStore    (tokio clock, dev + tests)
//!     +-- SessionBackend        (enum dispatch, chosen at startup)
//! ```
//!
//! # Modules
//!
//! - [`store`] -- The [`SessionStore`] contract, key layout, expiry config
//! - [`dragonfly`] -- `Dragonfly` connection and typed commands
//! - [`redis_store`] -- [`SessionStore`] over `Dragonfly`
//! - [`memory`] -- In-process [`SessionStore`]
//! - [`backend`] -- Runtime backend selection
//! - [`error`] -- Shared error types

pub mod backend;
pub mod dragonfly;
pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

// Re-export primary types for convenience.
pub use backend::SessionBackend;
pub use dragonfly::DragonflyPool;
pub use error::DbError;
pub use memory::MemorySessionStore;
pub use redis_store::DragonflySessionStore;
pub use store::{DEFAULT_SESSION_TTL, SessionStore, StoreConfig};
