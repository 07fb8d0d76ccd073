//! Shared application state for the session API and hub.
//!
//! [`AppState`] owns the orchestrator (which owns the session store and
//! engine client) and the [`BroadcastHub`]. The hub is shared with the
//! orchestrator so suggestions and `WebSocket` traffic go through the same
//! group membership.

use std::sync::Arc;

use gambit_core::{AnalysisConfig, AnalysisOrchestrator, EngineBackend};
use gambit_db::SessionBackend;

use crate::hub::BroadcastHub;

/// The orchestrator as wired in the running server.
pub type Orchestrator = AnalysisOrchestrator<SessionBackend, EngineBackend, Arc<BroadcastHub>>;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// Update cycle: store, engine and publisher.
    pub orchestrator: Orchestrator,
    /// Group membership and fan-out for `WebSocket` clients.
    pub hub: Arc<BroadcastHub>,
}

impl AppState {
    /// Wire a store and an engine to a fresh hub.
    pub fn new(sessions: SessionBackend, engine: EngineBackend, config: AnalysisConfig) -> Self {
        let hub = Arc::new(BroadcastHub::new());
        let orchestrator =
            AnalysisOrchestrator::new(sessions, engine, Arc::clone(&hub), config);
        Self { orchestrator, hub }
    }

    /// The session store.
    pub const fn sessions(&self) -> &SessionBackend {
        self.orchestrator.sessions()
    }
}
