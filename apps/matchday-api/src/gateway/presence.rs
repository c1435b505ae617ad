//! In-memory per-user presence tracking with multi-connection support.
//!
//! A user with several open tabs or devices has several live connections;
//! notification fan-out targets all of them. Presence is process-local and
//! best-effort: a restart loses it and clients rebuild it by reconnecting.

use std::collections::HashSet;

use dashmap::DashMap;

/// Maps a user id to the set of connection ids they currently hold.
///
/// Pure bookkeeping; no operation here can fail. The registry is injected
/// into the components that need it, never a module-level singleton.
#[derive(Default)]
pub struct PresenceRegistry {
    inner: DashMap<String, HashSet<String>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection for a user. Idempotent.
    pub fn register(&self, user_id: &str, connection_id: &str) {
        self.inner
            .entry(user_id.to_string())
            .or_default()
            .insert(connection_id.to_string());
    }

    /// Remove a connection. Drops the user's entry when their set empties so
    /// the map never accumulates dangling keys.
    pub fn unregister(&self, user_id: &str, connection_id: &str) {
        let now_empty = match self.inner.get_mut(user_id) {
            Some(mut entry) => {
                entry.remove(connection_id);
                entry.is_empty()
            }
            None => return,
        };
        if now_empty {
            self.inner.remove_if(user_id, |_, conns| conns.is_empty());
        }
    }

    /// Snapshot of the user's live connections. Empty when none are open —
    /// not an error.
    pub fn connections_for(&self, user_id: &str) -> Vec<String> {
        self.inner
            .get(user_id)
            .map(|entry| entry.iter().cloned().collect())
            .unwrap_or_default()
    }
}
