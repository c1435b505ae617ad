//! Outbound channels for live connections.
//!
//! The transport layer owns each socket; everything else addresses a
//! connection by id through this table. Pushing to a connection that has
//! already gone away is silently dropped — the disconnect path removes the
//! entry shortly after.

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::events::ServerEvent;

/// Maps a connection id to its outbound event queue.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: DashMap<String, mpsc::UnboundedSender<ServerEvent>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, connection_id: &str, sender: mpsc::UnboundedSender<ServerEvent>) {
        self.inner.insert(connection_id.to_string(), sender);
    }

    pub fn remove(&self, connection_id: &str) {
        self.inner.remove(connection_id);
    }

    /// Queue an event for one connection. A closed or unknown peer is not an
    /// error; its membership is cleaned up on disconnect.
    pub fn send_to(&self, connection_id: &str, event: ServerEvent) {
        if let Some(sender) = self.inner.get(connection_id) {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_to_queues_for_live_connection() {
        let reg = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        reg.insert("c1", tx);

        reg.send_to("c1", ServerEvent::error("VALIDATION_ERROR", "nope"));

        match rx.try_recv().unwrap() {
            ServerEvent::Error { code, .. } => assert_eq!(code, "VALIDATION_ERROR"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn send_to_unknown_connection_is_a_noop() {
        let reg = ConnectionRegistry::new();
        reg.send_to("ghost", ServerEvent::error("INTERNAL_ERROR", "x"));
    }

    #[test]
    fn send_to_removed_connection_is_a_noop() {
        let reg = ConnectionRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel();
        reg.insert("c1", tx);
        drop(rx);
        reg.remove("c1");
        reg.send_to("c1", ServerEvent::error("INTERNAL_ERROR", "x"));
    }
}
