//! Session registry and room membership
//!
//! Every live session sits behind the [`Connection`] trait. Rooms track
//! which table a session is watching; a session is in at most one room at a
//! time, and joining another table moves it.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use shared::error::AppResult;
use shared::message::BusMessage;
use tokio::sync::mpsc;

/// One live client session, independent of transport
#[async_trait]
pub trait Connection: Send + Sync + std::fmt::Debug {
    /// Stable id for the lifetime of the session
    fn id(&self) -> &str;

    /// Deliver one message to this session
    async fn send(&self, msg: &BusMessage) -> AppResult<()>;

    /// Close the underlying transport
    async fn close(&self) -> AppResult<()> {
        Ok(())
    }

    fn peer_addr(&self) -> Option<String> {
        None
    }
}

/// Registry of live sessions (session id -> connection) plus table rooms
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<dyn Connection>>,
    /// table id -> member session ids
    rooms: DashMap<i64, HashSet<String>>,
    /// session id -> the one table it currently watches
    membership: DashMap<String, i64>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly connected session
    pub fn register(&self, conn: Arc<dyn Connection>) {
        let id = conn.id().to_string();
        tracing::debug!(session_id = %id, addr = ?conn.peer_addr(), "session registered");
        self.sessions.insert(id, conn);
    }

    /// Drop a session and clean up its room membership
    pub fn unregister(&self, session_id: &str) {
        self.sessions.remove(session_id);
        if let Some((_, table_id)) = self.membership.remove(session_id) {
            if let Some(mut members) = self.rooms.get_mut(&table_id) {
                members.remove(session_id);
            }
        }
        tracing::debug!(session_id = %session_id, "session unregistered");
    }

    /// Put a session into the room of one table
    ///
    /// Idempotent; joining a different table leaves the previous room
    /// first.
    pub fn join_table(&self, session_id: &str, table_id: i64) {
        if let Some(previous) = self.membership.insert(session_id.to_string(), table_id) {
            if previous == table_id {
                return;
            }
            if let Some(mut members) = self.rooms.get_mut(&previous) {
                members.remove(session_id);
            }
        }
        self.rooms
            .entry(table_id)
            .or_default()
            .insert(session_id.to_string());
        tracing::debug!(session_id = %session_id, table_id, "session joined table room");
    }

    /// The table a session currently watches, if any
    pub fn watched_table(&self, session_id: &str) -> Option<i64> {
        self.membership.get(session_id).map(|entry| *entry)
    }

    /// Member sessions of one table room
    pub fn room_members(&self, table_id: i64) -> Vec<String> {
        self.rooms
            .get(&table_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Send one message to one session
    ///
    /// Returns false when the session is unknown or its transport failed.
    pub async fn send_to(&self, session_id: &str, msg: &BusMessage) -> bool {
        // Clone out of the map before awaiting; map guards must not be
        // held across await points.
        let conn = match self.sessions.get(session_id) {
            Some(entry) => entry.value().clone(),
            None => {
                tracing::warn!(session_id = %session_id, "send to unknown session");
                return false;
            }
        };
        match conn.send(msg).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "session send failed");
                false
            }
        }
    }

    /// Deliver one message to every registered session
    ///
    /// Returns the number of sessions that accepted it; individual failures
    /// are logged and skipped.
    pub async fn broadcast(&self, msg: &BusMessage) -> usize {
        let targets: Vec<Arc<dyn Connection>> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut delivered = 0;
        for conn in targets {
            match conn.send(msg).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        session_id = %conn.id(),
                        error = %e,
                        "broadcast delivery failed"
                    );
                }
            }
        }
        delivered
    }
}

/// In-process session over an unbounded channel
///
/// Backs the message handler's own loopback and test clients; network
/// sessions use [`super::TcpConnection`] instead.
#[derive(Debug)]
pub struct ChannelConnection {
    id: String,
    tx: mpsc::UnboundedSender<BusMessage>,
}

impl ChannelConnection {
    /// Create a connection plus the receiving end of its channel
    pub fn new(id: impl Into<String>) -> (Arc<Self>, mpsc::UnboundedReceiver<BusMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                id: id.into(),
                tx,
            }),
            rx,
        )
    }
}

#[async_trait]
impl Connection for ChannelConnection {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send(&self, msg: &BusMessage) -> AppResult<()> {
        self.tx
            .send(msg.clone())
            .map_err(|_| shared::error::AppError::client_disconnected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::{RequestPayload, ResponsePayload};

    #[tokio::test]
    async fn test_register_send_unregister() {
        let registry = SessionRegistry::new();
        let (conn, mut rx) = ChannelConnection::new("s1");
        registry.register(conn);
        assert_eq!(registry.session_count(), 1);

        let msg = BusMessage::response(&ResponsePayload::success("hi", None));
        assert!(registry.send_to("s1", &msg).await);
        assert_eq!(rx.recv().await.unwrap().payload, msg.payload);

        registry.unregister("s1");
        assert_eq!(registry.session_count(), 0);
        assert!(!registry.send_to("s1", &msg).await);
    }

    #[tokio::test]
    async fn test_join_moves_between_rooms() {
        let registry = SessionRegistry::new();
        let (conn, _rx) = ChannelConnection::new("s1");
        registry.register(conn);

        registry.join_table("s1", 3);
        registry.join_table("s1", 3);
        assert_eq!(registry.room_members(3), vec!["s1".to_string()]);

        registry.join_table("s1", 5);
        assert!(registry.room_members(3).is_empty());
        assert_eq!(registry.room_members(5), vec!["s1".to_string()]);
        assert_eq!(registry.watched_table("s1"), Some(5));
    }

    #[tokio::test]
    async fn test_unregister_leaves_room() {
        let registry = SessionRegistry::new();
        let (conn, _rx) = ChannelConnection::new("s1");
        registry.register(conn);
        registry.join_table("s1", 2);

        registry.unregister("s1");
        assert!(registry.room_members(2).is_empty());
        assert_eq!(registry.watched_table("s1"), None);
    }

    #[tokio::test]
    async fn test_broadcast_counts_only_live_sessions() {
        let registry = SessionRegistry::new();
        let (alive, mut rx) = ChannelConnection::new("alive");
        let (dead, dead_rx) = ChannelConnection::new("dead");
        registry.register(alive);
        registry.register(dead);
        drop(dead_rx);

        let msg = BusMessage::request(&RequestPayload::join_table(1));
        assert_eq!(registry.broadcast(&msg).await, 1);
        assert!(rx.recv().await.is_some());
    }
}
