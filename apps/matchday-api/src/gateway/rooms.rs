//! Per-match broadcast groups.
//!
//! A room is the transient set of connections currently admitted for a match.
//! It is derived state: authorization lives in the participation store, and a
//! connection only enters a room after the gate has passed. Per
//! (connection, match) pair the state machine is not-joined → joined →
//! not-joined; failed joins never transition.

use std::collections::HashSet;

use dashmap::DashMap;

/// Maps a match id to the set of admitted connection ids.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, HashSet<String>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a connection. Idempotent — re-joining is a no-op, not an error.
    pub fn join(&self, connection_id: &str, match_id: &str) {
        self.rooms
            .entry(match_id.to_string())
            .or_default()
            .insert(connection_id.to_string());
    }

    /// Remove a connection from one room. Safe to call for a non-member.
    pub fn leave(&self, connection_id: &str, match_id: &str) {
        let now_empty = match self.rooms.get_mut(match_id) {
            Some(mut members) => {
                members.remove(connection_id);
                members.is_empty()
            }
            None => return,
        };
        if now_empty {
            self.rooms.remove_if(match_id, |_, members| members.is_empty());
        }
    }

    /// Remove a connection from every room it is in and return the match ids
    /// it vacated. Called on disconnect so membership never leaks.
    pub fn leave_all(&self, connection_id: &str) -> Vec<String> {
        let match_ids: Vec<String> = self
            .rooms
            .iter()
            .filter(|entry| entry.value().contains(connection_id))
            .map(|entry| entry.key().clone())
            .collect();

        for match_id in &match_ids {
            self.leave(connection_id, match_id);
        }

        match_ids
    }

    /// Snapshot of the room's members. The fan-out set is fixed before
    /// iteration so a broadcast is all-or-nothing.
    pub fn members_of(&self, match_id: &str) -> Vec<String> {
        self.rooms
            .get(match_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }
}
