//! Session API and suggestion hub for the Gambit pipeline.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` hub** (`/hubs/chess`) where watchers join a session
//!   group and receive `analysis-started` and `suggestion` events
//! - **Session endpoints** for creating, reading and ending sessions
//! - **Analysis endpoints** that evaluate a position, optionally running a
//!   full update cycle that broadcasts the result to the session's group
//!
//! # Architecture
//!
//! ```text
//! watcher --REST--> handlers --> AnalysisOrchestrator --> SessionStore
//!                                      |            \--> EngineClient
//!                                      v
//!                                 BroadcastHub --> ws tasks --> watchers
//! ```
//!
//! The hub is created at startup, held by [`AppState`] and torn down on
//! shutdown. Group membership never outlives a connection.

pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod response;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use config::{ConfigError, EngineTarget, GambitConfig, LogFormat};
pub use error::ApiError;
pub use hub::{BroadcastHub, ConnectionRegistry};
pub use response::ApiResponse;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
