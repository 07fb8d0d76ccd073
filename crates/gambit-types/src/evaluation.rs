//! Engine evaluation results as broadcast to watchers.
//!
//! These mirror what the engine collaborator returns, re-stamped with the
//! time the result reached the pipeline. Field names serialize camelCase
//! for the browser side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Side {
    /// White to move.
    White,
    /// Black to move.
    Black,
}

/// One candidate move with its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct MoveEvaluation {
    /// Move in UCI notation (`e2e4`).
    #[serde(rename = "move")]
    pub uci: String,
    /// Move in SAN notation (`e4`).
    #[serde(rename = "moveSan")]
    pub san: String,
    /// Score in centipawns from the mover's perspective, absent when a mate
    /// is found.
    pub centipawn_score: Option<i32>,
    /// Forced mate distance; negative when the opponent mates.
    pub mate_in: Option<i32>,
    /// Search depth the score was produced at.
    pub depth: u32,
    /// Best continuation after this move, in UCI.
    pub principal_variation: Vec<String>,
}

impl MoveEvaluation {
    /// Whether this line leads to a forced mate for either side.
    pub const fn is_mate(&self) -> bool {
        self.mate_in.is_some()
    }
}

/// Full evaluation of one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct EvaluationResult {
    /// The evaluated position.
    pub fen: String,
    /// The engine's preferred move.
    pub best_move: MoveEvaluation,
    /// Alternatives in engine order, best first.
    pub top_moves: Vec<MoveEvaluation>,
    /// Side to move in `fen`.
    pub turn: Side,
    /// The side to move is in check.
    pub is_check: bool,
    /// The side to move is mated.
    pub is_checkmate: bool,
    /// The side to move has no legal moves and is not in check.
    pub is_stalemate: bool,
    /// Set by the engine when it answered from its own cache.
    pub cached: bool,
    /// When the result reached the pipeline.
    pub analysed_at: DateTime<Utc>,
}

impl EvaluationResult {
    /// Whether the game is over in this position.
    pub const fn is_terminal(&self) -> bool {
        self.is_checkmate || self.is_stalemate
    }
}
