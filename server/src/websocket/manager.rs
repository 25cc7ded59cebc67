//! WebSocket connection manager.
//!
//! Tracks active connections and the paths each of them watches, and fans
//! snapshots out after every change to the tree.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tasksync_engine::{RemotePath, Tree};
use tokio::sync::mpsc;

use super::ServerMessage;

/// Sender for WebSocket messages.
pub type MessageSender = mpsc::UnboundedSender<ServerMessage>;

/// A single WebSocket connection.
#[derive(Debug)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: String,
    /// Channel to send messages to this connection
    pub sender: MessageSender,
    pub connected_at: DateTime<Utc>,
}

/// A path watched by one connection.
#[derive(Debug, Clone)]
pub struct Watch {
    pub conn_id: String,
    pub path: RemotePath,
}

/// Manages active WebSocket connections and their subscriptions.
///
/// Thread-safe and can be shared across handlers via `Arc`.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    /// All active connections, keyed by connection ID.
    connections: DashMap<String, Connection>,
    /// All subscriptions, keyed by subscription ID.
    watches: DashMap<String, Watch>,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new connection manager wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection.
    ///
    /// Returns the connection ID.
    pub fn register(&self, sender: MessageSender) -> String {
        let conn_id = uuid::Uuid::new_v4().to_string();

        self.connections.insert(
            conn_id.clone(),
            Connection {
                id: conn_id.clone(),
                sender,
                connected_at: Utc::now(),
            },
        );

        tracing::info!(conn_id = %conn_id, "WebSocket connection registered");
        conn_id
    }

    /// Unregister a connection and drop all of its subscriptions.
    pub fn unregister(&self, conn_id: &str) {
        self.watches.retain(|_, watch| watch.conn_id != conn_id);

        if let Some((_, conn)) = self.connections.remove(conn_id) {
            let connected_for = Utc::now() - conn.connected_at;
            tracing::info!(
                conn_id = %conn_id,
                connected_secs = connected_for.num_seconds(),
                "WebSocket connection unregistered"
            );
        }
    }

    /// Add a subscription for `conn_id`. Returns the subscription ID.
    pub fn subscribe(&self, conn_id: &str, path: RemotePath) -> String {
        let sub_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(conn_id = %conn_id, sub_id = %sub_id, path = %path, "Subscribed");

        self.watches.insert(
            sub_id.clone(),
            Watch {
                conn_id: conn_id.to_string(),
                path,
            },
        );
        sub_id
    }

    /// Remove a subscription owned by `conn_id`.
    pub fn unsubscribe(&self, conn_id: &str, sub_id: &str) -> bool {
        self.watches
            .remove_if(sub_id, |_, watch| watch.conn_id == conn_id)
            .is_some()
    }

    /// Send a fresh snapshot to every subscription related to `changed`.
    ///
    /// Returns the number of snapshots sent.
    pub fn notify_change(&self, changed: &RemotePath, tree: &Tree) -> usize {
        let mut sent_count = 0;

        for entry in self.watches.iter() {
            let watch = entry.value();
            if !watch.path.is_related(changed) {
                continue;
            }
            let message =
                ServerMessage::snapshot(entry.key(), watch.path.to_string(), tree.get(&watch.path));
            if self.send_to(&watch.conn_id, message) {
                sent_count += 1;
            }
        }

        tracing::debug!(path = %changed, recipients = sent_count, "Notified subscribers");
        sent_count
    }

    /// Send a message to a specific connection.
    pub fn send_to(&self, conn_id: &str, message: ServerMessage) -> bool {
        match self.connections.get(conn_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Get the number of active connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of active subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.watches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> RemotePath {
        RemotePath::parse(s).unwrap()
    }

    #[test]
    fn test_register_unregister() {
        let manager = ConnectionManager::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let conn_id = manager.register(tx);
        manager.subscribe(&conn_id, path("tasks"));
        assert_eq!(manager.connection_count(), 1);
        assert_eq!(manager.subscription_count(), 1);

        manager.unregister(&conn_id);
        assert_eq!(manager.connection_count(), 0);
        assert_eq!(manager.subscription_count(), 0);
    }

    #[test]
    fn test_unsubscribe_requires_owner() {
        let manager = ConnectionManager::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let conn1 = manager.register(tx1);
        let conn2 = manager.register(tx2);

        let sub = manager.subscribe(&conn1, path("tasks"));
        assert!(!manager.unsubscribe(&conn2, &sub));
        assert!(manager.unsubscribe(&conn1, &sub));
        assert!(!manager.unsubscribe(&conn1, &sub));
    }

    #[test]
    fn test_notify_related_only() {
        let manager = ConnectionManager::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        let conn1 = manager.register(tx1);
        let conn2 = manager.register(tx2);
        let work = manager.subscribe(&conn1, path("tasks/Work"));
        manager.subscribe(&conn2, path("categories"));

        let changed = path("tasks/Work/1");
        let mut tree = Tree::new();
        tree.set(&changed, json!({"id": "1", "text": "Report"}));

        assert_eq!(manager.notify_change(&changed, &tree), 1);
        match rx1.try_recv().unwrap() {
            ServerMessage::Snapshot {
                subscription_id,
                path,
                value,
            } => {
                assert_eq!(subscription_id, work);
                assert_eq!(path, "tasks/Work");
                assert_eq!(value["1"]["text"], "Report");
            }
            other => panic!("Expected snapshot, got {:?}", other),
        }
        assert!(rx2.try_recv().is_err());

        // A change at the root touches every watch
        assert_eq!(manager.notify_change(&RemotePath::root(), &tree), 2);
    }
}
