//! Position update -> evaluation -> broadcast.
//!
//! One [`AnalysisOrchestrator::analyse_and_broadcast`] call is one update
//! cycle:
//!
//! ```text
//! Idle -> PositionReceived -> Evaluating -> Published -> Idle
//!              |                  |
//!              | (abort policy)   | (timeout / engine failure)
//!              v                  v
//!           NotFound       EngineUnavailable   (nothing published)
//! ```
//!
//! Cycles are request-scoped and share no locks. Two cycles for the same
//! session race on the store (last write wins) and their broadcasts may
//! arrive in either order. Nothing here retries; that is the caller's call.

use core::fmt;

use gambit_db::SessionStore;
use gambit_types::{EvaluationResult, ServerEvent, SessionId};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, MissingSessionPolicy};
use crate::engine::{EngineClient, EngineRequest};
use crate::error::AnalysisError;
use crate::publish::SuggestionPublisher;

/// Where a cycle currently is. Only used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Waiting for work.
    Idle,
    /// A position arrived and the session is being updated.
    PositionReceived,
    /// The engine call is in flight.
    Evaluating,
    /// The suggestion went out to the group.
    Published,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::PositionReceived => "position_received",
            Self::Evaluating => "evaluating",
            Self::Published => "published",
        };
        f.write_str(name)
    }
}

/// Composes the session store, the engine and the broadcast publisher.
pub struct AnalysisOrchestrator<S, E, P> {
    sessions: S,
    engine: E,
    publisher: P,
    config: AnalysisConfig,
}

impl<S, E, P> AnalysisOrchestrator<S, E, P>
where
    S: SessionStore,
    E: EngineClient,
    P: SuggestionPublisher,
{
    /// Assemble an orchestrator.
    pub const fn new(sessions: S, engine: E, publisher: P, config: AnalysisConfig) -> Self {
        Self {
            sessions,
            engine,
            publisher,
            config,
        }
    }

    /// The session store, for the session lifecycle endpoints.
    pub const fn sessions(&self) -> &S {
        &self.sessions
    }

    /// The engine client.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// The active settings.
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run one update cycle for `session_id` at position `fen`.
    ///
    /// Persists the position (if the session exists), evaluates it within
    /// the configured timeout and publishes a `suggestion` event to the
    /// session's group. Returns the evaluation to the caller as well.
    /// `depth` and `top_moves` are passed through to the engine; `None`
    /// leaves the engine's defaults.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Validation`] if `fen` is blank.
    /// - [`AnalysisError::NotFound`] if the session is missing and the
    ///   policy is [`MissingSessionPolicy::Abort`].
    /// - [`AnalysisError::EngineUnavailable`] on engine failure or timeout.
    /// - [`AnalysisError::Unexpected`] if the store fails.
    pub async fn analyse_and_broadcast(
        &self,
        session_id: SessionId,
        fen: &str,
        depth: Option<u32>,
        top_moves: Option<u32>,
    ) -> Result<EvaluationResult, AnalysisError> {
        let fen = require_position(fen)?;
        debug!(session_id = %session_id, state = %CycleState::PositionReceived, "Cycle started");

        match self.sessions.get_by_id(session_id).await? {
            Some(mut session) => {
                session.set_position(fen);
                self.sessions.update(session).await?;
            }
            None => match self.config.missing_session {
                MissingSessionPolicy::Tolerate => {
                    warn!(session_id = %session_id, "Session not found, evaluating without persisting");
                }
                MissingSessionPolicy::Abort => {
                    return Err(AnalysisError::NotFound(format!("session {session_id}")));
                }
            },
        }

        debug!(session_id = %session_id, state = %CycleState::Evaluating, ?depth, "Requesting evaluation");
        let result = self
            .evaluate(&EngineRequest {
                fen: fen.to_owned(),
                depth,
                top_moves,
            })
            .await?;

        self.publisher
            .publish(session_id, ServerEvent::Suggestion(result.clone()))
            .await;

        info!(
            session_id = %session_id,
            best_move = %result.best_move.san,
            state = %CycleState::Published,
            "Broadcast suggestion"
        );
        Ok(result)
    }

    /// Evaluate a position without touching sessions or broadcasting.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Validation`] if `fen` is blank.
    /// - [`AnalysisError::EngineUnavailable`] on engine failure or timeout.
    pub async fn analyse_position(
        &self,
        fen: &str,
        depth: Option<u32>,
        top_moves: Option<u32>,
    ) -> Result<EvaluationResult, AnalysisError> {
        let fen = require_position(fen)?;
        info!(fen, "Analysing position");
        self.evaluate(&EngineRequest {
            fen: fen.to_owned(),
            depth,
            top_moves,
        })
        .await
    }

    /// Call the engine under the configured bound. A timeout is treated
    /// exactly like any other engine failure.
    async fn evaluate(&self, request: &EngineRequest) -> Result<EvaluationResult, AnalysisError> {
        match timeout(self.config.engine_timeout, self.engine.analyse(request)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                warn!(engine = self.engine.name(), error = %e, "Engine call failed");
                Err(AnalysisError::EngineUnavailable(e.to_string()))
            }
            Err(_) => {
                warn!(
                    engine = self.engine.name(),
                    timeout_ms = self.config.engine_timeout.as_millis(),
                    "Engine deadline exceeded"
                );
                Err(AnalysisError::EngineUnavailable(format!(
                    "no answer within {}ms",
                    self.config.engine_timeout.as_millis()
                )))
            }
        }
    }
}

fn require_position(fen: &str) -> Result<&str, AnalysisError> {
    let fen = fen.trim();
    if fen.is_empty() {
        return Err(AnalysisError::Validation(String::from(
            "position string is required",
        )));
    }
    Ok(fen)
}
