pub mod actor;
pub mod broadcast;
pub mod handler;

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Type alias for the sender half of a WebSocket connection's channel.
/// Other parts of the system can clone this to push messages to a specific client.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

/// Identity of one live connection, unique for the life of the process.
pub type ConnectionId = Uuid;

/// Handle to one live connection: its identity plus the queue its writer drains.
#[derive(Debug, Clone)]
pub struct LiveConnection {
    pub id: ConnectionId,
    pub sender: ConnectionSender,
}

impl LiveConnection {
    pub fn new(sender: ConnectionSender) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }
}

/// Live connections grouped by subscriber key (the owning user id).
///
/// Cloning is cheap and every clone sees the same registry. Entries are
/// created on first subscribe and kept, possibly empty, for the life of the
/// process. No operation fails for an unknown key.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    subscribers: Arc<DashMap<i64, HashMap<ConnectionId, ConnectionSender>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `connection` under `key`. Registering the same connection twice
    /// leaves a single member.
    pub fn subscribe(&self, key: i64, connection: &LiveConnection) {
        let count = {
            let mut members = self.subscribers.entry(key).or_default();
            members.insert(connection.id, connection.sender.clone());
            members.len()
        };

        tracing::debug!(
            user_id = key,
            connection_id = %connection.id,
            connections = count,
            "Connection subscribed"
        );
    }

    /// Remove a connection from `key`. Returns whether it was still a member.
    pub fn unsubscribe(&self, key: i64, connection_id: ConnectionId) -> bool {
        let removed = self
            .subscribers
            .get_mut(&key)
            .map(|mut members| members.remove(&connection_id).is_some())
            .unwrap_or(false);

        if removed {
            tracing::debug!(
                user_id = key,
                connection_id = %connection_id,
                "Connection unsubscribed"
            );
        }
        removed
    }

    /// Owned snapshot of the members of `key`.
    ///
    /// The shard lock is released before this returns, so callers may send,
    /// subscribe, or unsubscribe while iterating the result.
    pub fn connections_for(&self, key: i64) -> Vec<LiveConnection> {
        self.subscribers
            .get(&key)
            .map(|members| {
                members
                    .iter()
                    .map(|(id, sender)| LiveConnection {
                        id: *id,
                        sender: sender.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn connection_count(&self, key: i64) -> usize {
        self.subscribers
            .get(&key)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    /// Number of keys that have ever had a subscriber.
    pub fn key_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> (LiveConnection, mpsc::UnboundedReceiver<axum::extract::ws::Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (LiveConnection::new(tx), rx)
    }

    #[test]
    fn unknown_key_is_empty() {
        let registry = SubscriptionRegistry::new();
        assert!(registry.connections_for(9).is_empty());
        assert_eq!(registry.connection_count(9), 0);
        assert!(!registry.unsubscribe(9, Uuid::new_v4()));
        assert_eq!(registry.key_count(), 0);
    }

    #[test]
    fn subscribe_is_idempotent_per_connection() {
        let registry = SubscriptionRegistry::new();
        let (conn, _rx) = connection();

        registry.subscribe(1, &conn);
        registry.subscribe(1, &conn);

        assert_eq!(registry.connection_count(1), 1);
    }

    #[test]
    fn keys_are_independent() {
        let registry = SubscriptionRegistry::new();
        let (a, _rx_a) = connection();
        let (b, _rx_b) = connection();
        let (c, _rx_c) = connection();

        registry.subscribe(1, &a);
        registry.subscribe(1, &b);
        registry.subscribe(2, &c);

        let mut ids: Vec<_> = registry.connections_for(1).iter().map(|c| c.id).collect();
        ids.sort();
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(ids, expected);
        assert_eq!(registry.connection_count(2), 1);
    }

    #[test]
    fn unsubscribe_twice_is_a_no_op_and_entry_remains() {
        let registry = SubscriptionRegistry::new();
        let (conn, _rx) = connection();
        registry.subscribe(4, &conn);

        assert!(registry.unsubscribe(4, conn.id));
        assert!(!registry.unsubscribe(4, conn.id));

        assert_eq!(registry.connection_count(4), 0);
        assert_eq!(registry.key_count(), 1);
    }

    #[test]
    fn snapshot_is_detached_from_later_mutation() {
        let registry = SubscriptionRegistry::new();
        let (a, _rx_a) = connection();
        let (b, _rx_b) = connection();
        registry.subscribe(1, &a);

        let snapshot = registry.connections_for(1);
        for member in &snapshot {
            registry.unsubscribe(1, member.id);
            registry.subscribe(1, &b);
        }

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, a.id);
        assert_eq!(registry.connection_count(1), 1);
    }

    #[test]
    fn clones_share_state() {
        let registry = SubscriptionRegistry::new();
        let other = registry.clone();
        let (conn, _rx) = connection();

        other.subscribe(3, &conn);
        assert_eq!(registry.connection_count(3), 1);
    }

    #[test]
    fn concurrent_subscribe_and_unsubscribe_keep_membership_consistent() {
        let registry = SubscriptionRegistry::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let mut kept = Vec::new();
                    for i in 0..200 {
                        let (tx, rx) = mpsc::unbounded_channel();
                        let conn = LiveConnection::new(tx);
                        registry.subscribe(1, &conn);
                        let _ = registry.connections_for(1);
                        if i % 2 == 0 {
                            registry.unsubscribe(1, conn.id);
                        } else {
                            kept.push(rx);
                        }
                    }
                    kept.len()
                })
            })
            .collect();

        let kept: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(registry.connection_count(1), kept);
    }
}
