//! Board watching for the Gambit suggestion pipeline.
//!
//! Runs next to the board the user plays on. It notices when the position
//! changes, reads the new position from the page and reports it to the
//! session API, which analyses it and broadcasts a suggestion back.
//!
//! ```text
//! BoardPage --> BoardWatcher --changes--> forward_changes --> AnalysisClient
//!    ^              ^                           |
//!    |        MutationSink / timer          SessionContext
//!  browser binding
//! ```
//!
//! # Modules
//!
//! - [`page`] -- Read-only seam over the host page
//! - [`extractor`] -- Ordered position extraction strategies
//! - [`fen`] -- Placement rebuilt from piece elements
//! - [`watcher`] -- Trigger sources, deduplication, board wait
//! - [`settings`] -- User settings with defaults
//! - [`client`] -- Session API client
//! - [`context`] -- Session context and change forwarding

pub mod client;
pub mod context;
pub mod extractor;
pub mod fen;
pub mod page;
pub mod settings;
pub mod watcher;

pub use client::{AnalysisClient, ClientError};
pub use context::{SessionContext, forward_changes};
pub use extractor::{ExtractedPosition, PositionSource, extract};
pub use page::{BoardPage, HostCall, MutationRecord};
pub use settings::WatcherSettings;
pub use watcher::{BoardWatcher, MutationSink, RunningWatcher, Trigger, wait_for_board};
