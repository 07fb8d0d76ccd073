//! Position extraction with ordered fallback.
//!
//! ```text
//! attribute --NotFound--> host object --NotFound--> DOM reconstruction --NotFound--> None
//!     |                        |                           |
//!   Found                    Found                       Found (approximate)
//! ```
//!
//! The first strategy that finds a position wins and later strategies are
//! never consulted. No strategy fails: anything unexpected on the page is
//! a miss.

use core::fmt;

use tracing::debug;

use crate::fen;
use crate::page::{BoardPage, HostCall};

/// Page globals that may hold the game object, in lookup order.
pub const HOST_GLOBALS: [&str; 3] = ["ChessComGame", "game", "chessboard"];

/// Accessors tried on the game object, in order.
pub const HOST_ACCESSORS: [&str; 2] = ["getFen", "fen"];

/// Result of one extraction strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// The strategy produced a position.
    Found(String),
    /// The strategy has nothing to offer on this page.
    NotFound,
}

/// Which strategy produced a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionSource {
    /// The board component's `fen` attribute.
    Attribute,
    /// A host-page game object.
    HostObject,
    /// Rebuilt from piece elements; metadata fields are placeholders.
    DomReconstruction,
}

impl fmt::Display for PositionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Attribute => "attribute",
            Self::HostObject => "host_object",
            Self::DomReconstruction => "dom",
        })
    }
}

/// A position read from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPosition {
    /// The position string.
    pub fen: String,
    /// Strategy that produced it.
    pub source: PositionSource,
}

impl ExtractedPosition {
    /// Whether side to move, castling and counters were guessed.
    pub const fn is_approximate(&self) -> bool {
        matches!(self.source, PositionSource::DomReconstruction)
    }
}

type Strategy = fn(&dyn BoardPage) -> Attempt;

const STRATEGIES: [(PositionSource, Strategy); 3] = [
    (PositionSource::Attribute, try_attribute),
    (PositionSource::HostObject, try_host_object),
    (PositionSource::DomReconstruction, try_dom),
];

/// Read the current position from `page`, or `None` if no strategy can.
pub fn extract(page: &dyn BoardPage) -> Option<ExtractedPosition> {
    STRATEGIES.iter().find_map(|(source, strategy)| match strategy(page) {
        Attempt::Found(fen) => Some(ExtractedPosition {
            fen,
            source: *source,
        }),
        Attempt::NotFound => None,
    })
}

fn try_attribute(page: &dyn BoardPage) -> Attempt {
    page.fen_attribute()
        .filter(|fen| !fen.trim().is_empty())
        .map_or(Attempt::NotFound, Attempt::Found)
}

fn try_host_object(page: &dyn BoardPage) -> Attempt {
    let Some(global) = HOST_GLOBALS.into_iter().find(|name| page.has_global(name)) else {
        return Attempt::NotFound;
    };
    for accessor in HOST_ACCESSORS {
        match page.call_accessor(global, accessor) {
            HostCall::Value(fen) if !fen.trim().is_empty() => return Attempt::Found(fen),
            HostCall::Value(_) | HostCall::Missing => {}
            HostCall::Threw(reason) => {
                debug!(global, accessor, reason = %reason, "Host accessor threw");
                return Attempt::NotFound;
            }
        }
    }
    Attempt::NotFound
}

fn try_dom(page: &dyn BoardPage) -> Attempt {
    fen::reconstruct(&page.piece_classes()).map_or(Attempt::NotFound, Attempt::Found)
}
