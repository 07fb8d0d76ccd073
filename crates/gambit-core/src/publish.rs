//! Publishing seam between the orchestrator and the broadcast hub.
//!
//! The orchestrator only knows that events can be sent to a session's
//! group; the hub that owns group membership implements this trait.

use std::future::Future;
use std::sync::Arc;

use gambit_types::{ServerEvent, SessionId};

/// Fan-out target for session events.
///
/// Delivery is fire-and-forget: implementations swallow (and log)
/// per-member failures and never report them back.
pub trait SuggestionPublisher: Send + Sync {
    /// Send `event` to every member of `session_id`'s group.
    fn publish(&self, session_id: SessionId, event: ServerEvent) -> impl Future<Output = ()> + Send;
}

impl<T: SuggestionPublisher> SuggestionPublisher for Arc<T> {
    fn publish(&self, session_id: SessionId, event: ServerEvent) -> impl Future<Output = ()> + Send {
        (**self).publish(session_id, event)
    }
}
