//! Group-based fan-out of hub events to connected watchers.
//!
//! Every `WebSocket` connection registers an outbound queue in the
//! [`ConnectionRegistry`]. The [`BroadcastHub`] layers session groups on top:
//! a connection belongs to at most one group at a time, and a `notify` for a
//! session reaches every connection currently in that group.
//!
//! ```text
//! orchestrator / ws handler
//!         |
//!         v
//!   BroadcastHub::notify(session, event)
//!         |  serialize once
//!         v
//!   group members --try_send--> per-connection mpsc --> socket task
//! ```
//!
//! Membership is process-local and dies with the connection. Delivery is
//! fire-and-forget: a full or closed queue is logged and skipped.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use gambit_core::SuggestionPublisher;
use gambit_types::{ConnectionId, ServerEvent, SessionId};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

/// Outbound frames queued per connection before sends start failing.
pub const OUTBOUND_CAPACITY: usize = 64;

/// A serialized frame shared by every recipient of one broadcast.
pub type Frame = Arc<String>;

/// Live connections and their outbound queues.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<Frame>>>,
    /// Tracks the map size so count queries skip the lock.
    active_count: AtomicUsize,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Register a connection's outbound queue.
    pub async fn register(&self, id: ConnectionId, tx: mpsc::Sender<Frame>) {
        let mut conns = self.connections.write().await;
        if conns.insert(id, tx).is_none() {
            let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drop a connection's queue. Returns whether it was registered.
    pub async fn remove(&self, id: ConnectionId) -> bool {
        let mut conns = self.connections.write().await;
        let removed = conns.remove(&id).is_some();
        if removed {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    /// Queue a frame for one connection. Returns `false` if the connection
    /// is gone or its queue is full.
    pub async fn send(&self, id: ConnectionId, frame: Frame) -> bool {
        let conns = self.connections.read().await;
        conns.get(&id).is_some_and(|tx| tx.try_send(frame).is_ok())
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Whether no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every queue, which ends every socket task.
    pub async fn clear(&self) {
        let mut conns = self.connections.write().await;
        conns.clear();
        self.active_count.store(0, Ordering::Relaxed);
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Groups {
    members: HashMap<SessionId, HashSet<ConnectionId>>,
    joined: HashMap<ConnectionId, SessionId>,
}

impl Groups {
    fn leave(&mut self, connection_id: ConnectionId) -> Option<SessionId> {
        let session_id = self.joined.remove(&connection_id)?;
        if let Some(set) = self.members.get_mut(&session_id) {
            set.remove(&connection_id);
            if set.is_empty() {
                self.members.remove(&session_id);
            }
        }
        Some(session_id)
    }
}

/// Session groups over a [`ConnectionRegistry`].
pub struct BroadcastHub {
    registry: ConnectionRegistry,
    groups: RwLock<Groups>,
}

impl BroadcastHub {
    /// Create a hub with no connections.
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            groups: RwLock::new(Groups::default()),
        }
    }

    /// Register a new connection and hand back its id and outbound queue.
    ///
    /// The receiver yields `None` once the connection is disconnected or
    /// the hub shuts down.
    pub async fn connect(&self) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        self.registry.register(id, tx).await;
        info!(connection_id = %id, "Client connected");
        (id, rx)
    }

    /// Forget a connection and its group membership.
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        let left = self.groups.write().await.leave(connection_id);
        self.registry.remove(connection_id).await;
        info!(connection_id = %connection_id, session_id = ?left, "Client disconnected");
    }

    /// Put a connection into `session_id`'s group, leaving any previous
    /// group, and acknowledge privately to that connection only.
    pub async fn join(&self, connection_id: ConnectionId, session_id: SessionId) {
        {
            let mut groups = self.groups.write().await;
            groups.leave(connection_id);
            groups
                .members
                .entry(session_id)
                .or_default()
                .insert(connection_id);
            groups.joined.insert(connection_id, session_id);
        }
        info!(connection_id = %connection_id, session_id = %session_id, "Client joined session");

        let ack = ServerEvent::JoinedSession {
            session_id,
            message: String::from("Connected to Gambit, suggestions incoming"),
        };
        self.send_to(connection_id, &ack).await;
    }

    /// Send an event to a single connection.
    pub async fn send_to(&self, connection_id: ConnectionId, event: &ServerEvent) {
        let Some(frame) = encode(event) else { return };
        if !self.registry.send(connection_id, frame).await {
            warn!(connection_id = %connection_id, event = event.name(), "Failed to queue event for client");
        }
    }

    /// Deliver `event` to every connection in `session_id`'s group.
    ///
    /// A failed send to one member is logged and does not affect the
    /// others. Nothing is reported back.
    pub async fn notify(&self, session_id: SessionId, event: &ServerEvent) {
        let Some(frame) = encode(event) else { return };

        let members: Vec<ConnectionId> = {
            let groups = self.groups.read().await;
            groups
                .members
                .get(&session_id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default()
        };

        let mut delivered: usize = 0;
        for connection_id in &members {
            if self.registry.send(*connection_id, Arc::clone(&frame)).await {
                delivered = delivered.saturating_add(1);
            } else {
                warn!(
                    connection_id = %connection_id,
                    session_id = %session_id,
                    event = event.name(),
                    "Failed to send event to group member"
                );
            }
        }
        debug!(
            session_id = %session_id,
            event = event.name(),
            recipients = members.len(),
            delivered,
            "Broadcast event"
        );
    }

    /// Drop every connection and all membership.
    pub async fn shutdown(&self) {
        let count = self.registry.len();
        {
            let mut groups = self.groups.write().await;
            groups.members.clear();
            groups.joined.clear();
        }
        self.registry.clear().await;
        info!(connections = count, "Hub shut down");
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of connections currently in `session_id`'s group.
    pub async fn group_size(&self, session_id: SessionId) -> usize {
        self.groups
            .read()
            .await
            .members
            .get(&session_id)
            .map_or(0, HashSet::len)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestionPublisher for BroadcastHub {
    async fn publish(&self, session_id: SessionId, event: ServerEvent) {
        self.notify(session_id, &event).await;
    }
}

fn encode(event: &ServerEvent) -> Option<Frame> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Arc::new(json)),
        Err(e) => {
            warn!(event = event.name(), error = %e, "Failed to serialize event");
            None
        }
    }
}
