//! Fan-out of committed records to live subscribers.
//!
//! Delivery is best-effort and at-most-once. A message is handed to each
//! connection's unbounded outbound queue and the caller moves on; the
//! connection's writer task does the socket I/O. A subscriber that connects
//! after dispatch, or whose queue is already closed, misses the message. There
//! is no retry and nothing is persisted.

use axum::extract::ws::Message;
use serde::Serialize;

use super::SubscriptionRegistry;

/// Push `record` to every connection subscribed to `key`.
///
/// Returns how many connections accepted the message. A closed connection is
/// unsubscribed and skipped; it never stops delivery to the others.
pub fn dispatch<T: Serialize>(registry: &SubscriptionRegistry, key: i64, record: &T) -> usize {
    let connections = registry.connections_for(key);
    if connections.is_empty() {
        tracing::trace!(user_id = key, "No live subscribers");
        return 0;
    }

    let payload = match serde_json::to_string(record) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(user_id = key, error = %e, "Failed to serialize live record");
            return 0;
        }
    };
    let msg = Message::Text(payload.into());

    let mut delivered = 0;
    for connection in connections {
        if connection.sender.send(msg.clone()).is_ok() {
            delivered += 1;
        } else {
            tracing::debug!(
                user_id = key,
                connection_id = %connection.id,
                "Subscriber queue closed, dropping connection"
            );
            registry.unsubscribe(key, connection.id);
        }
    }

    tracing::debug!(user_id = key, delivered, "Record dispatched");
    delivered
}
