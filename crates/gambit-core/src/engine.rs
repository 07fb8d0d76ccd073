//! Engine collaborator client.
//!
//! The engine is a separate HTTP service that evaluates positions. This
//! module defines the [`EngineClient`] seam, the HTTP implementation that
//! speaks the engine's snake_case JSON contract, and a stub that answers
//! with a canned evaluation for offline runs and tests.
//!
//! ```text
//! POST {engine}/api/v1/analyse   {"fen", "depth"?, "top_moves"?}
//!   -> {"fen", "best_move", "top_moves", "turn", "is_check", ...}
//! ```
//!
//! The orchestrator bounds every call with its own timeout; the HTTP
//! client carries the same bound so a hung socket is also torn down.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use gambit_types::{EvaluationResult, MoveEvaluation, Side};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EngineError;

/// What to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineRequest {
    /// Position to evaluate.
    pub fen: String,
    /// Search depth override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    /// How many alternative moves to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_moves: Option<u32>,
}

impl EngineRequest {
    /// Request with engine defaults for depth and move count.
    pub fn new(fen: impl Into<String>) -> Self {
        Self {
            fen: fen.into(),
            depth: None,
            top_moves: None,
        }
    }
}

/// Something that can evaluate a position.
pub trait EngineClient: Send + Sync {
    /// Evaluate one position.
    fn analyse(
        &self,
        request: &EngineRequest,
    ) -> impl Future<Output = Result<EvaluationResult, EngineError>> + Send;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Unified backend enum (dyn-compatible alternative to async trait objects)
// ---------------------------------------------------------------------------

/// The engine client selected at startup.
pub enum EngineBackend {
    /// The engine HTTP service.
    Http(HttpEngineClient),
    /// Canned answers, no network.
    Stub(StubEngine),
}

impl EngineClient for EngineBackend {
    async fn analyse(&self, request: &EngineRequest) -> Result<EvaluationResult, EngineError> {
        match self {
            Self::Http(client) => client.analyse(request).await,
            Self::Stub(stub) => stub.analyse(request).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Http(client) => client.name(),
            Self::Stub(stub) => stub.name(),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP engine
// ---------------------------------------------------------------------------

/// Client for the engine HTTP service.
pub struct HttpEngineClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEngineClient {
    /// Build a client for the engine at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

impl EngineClient for HttpEngineClient {
    async fn analyse(&self, request: &EngineRequest) -> Result<EvaluationResult, EngineError> {
        let url = format!("{}/api/v1/analyse", self.base_url);
        info!(fen = %request.fen, "Sending position to engine");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: EngineAnalysisResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))?;

        let result = body.into_result()?;
        debug!(fen = %result.fen, best = %result.best_move.san, cached = result.cached, "Engine answered");
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// ---- Engine response models (snake_case wire format) ----

#[derive(Debug, Deserialize)]
struct EngineAnalysisResponse {
    fen: String,
    best_move: EngineMoveResponse,
    #[serde(default)]
    top_moves: Vec<EngineMoveResponse>,
    turn: String,
    is_check: bool,
    is_checkmate: bool,
    is_stalemate: bool,
    #[serde(default)]
    cached: bool,
}

#[derive(Debug, Deserialize)]
struct EngineMoveResponse {
    #[serde(rename = "move")]
    uci: String,
    move_san: String,
    centipawn_score: Option<i32>,
    mate_in: Option<i32>,
    depth: u32,
    #[serde(default)]
    pv: Vec<String>,
}

impl EngineMoveResponse {
    fn into_move(self) -> MoveEvaluation {
        MoveEvaluation {
            uci: self.uci,
            san: self.move_san,
            centipawn_score: self.centipawn_score,
            mate_in: self.mate_in,
            depth: self.depth,
            principal_variation: self.pv,
        }
    }
}

impl EngineAnalysisResponse {
    fn into_result(self) -> Result<EvaluationResult, EngineError> {
        let turn = parse_side(&self.turn)
            .ok_or_else(|| EngineError::Decode(format!("unknown side to move {:?}", self.turn)))?;
        Ok(EvaluationResult {
            fen: self.fen,
            best_move: self.best_move.into_move(),
            top_moves: self
                .top_moves
                .into_iter()
                .map(EngineMoveResponse::into_move)
                .collect(),
            turn,
            is_check: self.is_check,
            is_checkmate: self.is_checkmate,
            is_stalemate: self.is_stalemate,
            cached: self.cached,
            analysed_at: Utc::now(),
        })
    }
}

fn parse_side(raw: &str) -> Option<Side> {
    match raw.to_ascii_lowercase().as_str() {
        "white" | "w" => Some(Side::White),
        "black" | "b" => Some(Side::Black),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Stub engine
// ---------------------------------------------------------------------------

/// An engine that always suggests the same move.
///
/// Used for local runs without the engine service and in tests. An
/// optional delay simulates a slow search; `failing` simulates an engine
/// that is down.
#[derive(Debug, Clone, Default)]
pub struct StubEngine {
    delay: Duration,
    fail: bool,
}

impl StubEngine {
    /// A stub that answers immediately.
    pub const fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: false,
        }
    }

    /// A stub that waits `delay` before answering.
    pub const fn with_delay(delay: Duration) -> Self {
        Self { delay, fail: false }
    }

    /// A stub whose every call fails.
    pub const fn failing() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: true,
        }
    }
}

impl EngineClient for StubEngine {
    async fn analyse(&self, request: &EngineRequest) -> Result<EvaluationResult, EngineError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(EngineError::Status {
                status: 503,
                body: String::from("stub engine is down"),
            });
        }

        let turn = request
            .fen
            .split_whitespace()
            .nth(1)
            .and_then(parse_side)
            .unwrap_or(Side::White);
        let best = MoveEvaluation {
            uci: String::from("e2e4"),
            san: String::from("e4"),
            centipawn_score: Some(30),
            mate_in: None,
            depth: request.depth.unwrap_or(1),
            principal_variation: vec![String::from("e2e4")],
        };

        Ok(EvaluationResult {
            fen: request.fen.clone(),
            top_moves: vec![best.clone()],
            best_move: best,
            turn,
            is_check: false,
            is_checkmate: false,
            is_stalemate: false,
            cached: false,
            analysed_at: Utc::now(),
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn engine_response_maps_to_result() {
        let raw = serde_json::json!({
            "fen": "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            "best_move": {
                "move": "e7e5", "move_san": "e5", "centipawn_score": -20,
                "mate_in": null, "depth": 20, "pv": ["e7e5", "g1f3"]
            },
            "top_moves": [
                {"move": "e7e5", "move_san": "e5", "centipawn_score": -20, "mate_in": null, "depth": 20, "pv": ["e7e5"]},
                {"move": "c7c5", "move_san": "c5", "centipawn_score": -25, "mate_in": null, "depth": 20, "pv": ["c7c5"]}
            ],
            "turn": "black",
            "is_check": false,
            "is_checkmate": false,
            "is_stalemate": false,
            "cached": true
        });
        let parsed: EngineAnalysisResponse = serde_json::from_value(raw).unwrap();
        let result = parsed.into_result().unwrap();

        assert_eq!(result.turn, Side::Black);
        assert_eq!(result.best_move.san, "e5");
        assert_eq!(result.best_move.principal_variation, vec!["e7e5", "g1f3"]);
        assert_eq!(result.top_moves.len(), 2);
        assert_eq!(result.top_moves.get(1).map(|m| m.uci.as_str()), Some("c7c5"));
        assert!(result.cached);
    }

    #[test]
    fn unknown_turn_is_a_decode_error() {
        let raw = serde_json::json!({
            "fen": "x", "turn": "purple",
            "best_move": {"move": "a", "move_san": "a", "depth": 1},
            "is_check": false, "is_checkmate": false, "is_stalemate": false
        });
        let parsed: EngineAnalysisResponse = serde_json::from_value(raw).unwrap();
        assert!(matches!(parsed.into_result(), Err(EngineError::Decode(_))));
    }

    #[test]
    fn request_omits_unset_options() {
        let json = serde_json::to_value(EngineRequest::new("fen")).unwrap();
        assert_eq!(json, serde_json::json!({"fen": "fen"}));

        let json = serde_json::to_value(EngineRequest {
            fen: String::from("fen"),
            depth: Some(12),
            top_moves: Some(3),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"fen": "fen", "depth": 12, "top_moves": 3}));
    }

    #[tokio::test]
    async fn stub_reads_side_to_move() {
        let stub = StubEngine::new();
        let result = stub
            .analyse(&EngineRequest::new("8/8/8/8/8/8/8/8 b - - 0 1"))
            .await
            .unwrap();
        assert_eq!(result.turn, Side::Black);
        assert_eq!(result.best_move.uci, "e2e4");
    }

    #[tokio::test]
    async fn failing_stub_errors() {
        let stub = StubEngine::failing();
        let result = stub.analyse(&EngineRequest::new("x")).await;
        assert!(matches!(result, Err(EngineError::Status { status: 503, .. })));
    }
}
