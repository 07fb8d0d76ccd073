//! Analysis orchestration for the Gambit suggestion pipeline.
//!
//! An update cycle takes a position reported for a session, persists it,
//! asks the engine for an evaluation under a hard deadline and publishes
//! the resulting suggestion to everyone watching that session.
//!
//! # Modules
//!
//! - [`orchestrator`] -- The update cycle
//! - [`engine`] -- Engine client seam, HTTP client and stub
//! - [`publish`] -- Fan-out seam implemented by the broadcast hub
//! - [`config`] -- Timeout and missing-session policy
//! - [`error`] -- Error taxonomy

pub mod config;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod publish;

pub use config::{AnalysisConfig, DEFAULT_ENGINE_TIMEOUT, MissingSessionPolicy};
pub use engine::{EngineBackend, EngineClient, EngineRequest, HttpEngineClient, StubEngine};
pub use error::{AnalysisError, EngineError};
pub use orchestrator::{AnalysisOrchestrator, CycleState};
pub use publish::SuggestionPublisher;
