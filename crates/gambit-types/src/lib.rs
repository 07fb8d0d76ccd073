//! Shared type definitions for the Gambit suggestion pipeline.
//!
//! This crate is the single source of truth for the records and wire
//! events exchanged between the session service, the suggestion hub and
//! the board watcher. Types flow downstream to `TypeScript` via `ts-rs`
//! for the in-page overlay.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for sessions and connections
//! - [`session`] -- Persisted session record and status
//! - [`evaluation`] -- Engine evaluation results
//! - [`events`] -- Hub `WebSocket` frames

pub mod evaluation;
pub mod events;
pub mod ids;
pub mod session;

// Re-export all public types at crate root for convenience.
pub use evaluation::{EvaluationResult, MoveEvaluation, Side};
pub use events::{ClientEvent, ServerEvent};
pub use ids::{ConnectionId, SessionId};
pub use session::{Session, SessionStatus, normalize_username};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings when `export_all` runs; the files land
        // in `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::SessionId::export_all();
        let _ = crate::ids::ConnectionId::export_all();
        let _ = crate::session::SessionStatus::export_all();
        let _ = crate::session::Session::export_all();
        let _ = crate::evaluation::Side::export_all();
        let _ = crate::evaluation::MoveEvaluation::export_all();
        let _ = crate::evaluation::EvaluationResult::export_all();
        let _ = crate::events::ClientEvent::export_all();
        let _ = crate::events::ServerEvent::export_all();
    }
}
