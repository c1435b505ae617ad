//! The policy choke-point for chat access.
//!
//! Authorization is re-derived from durable state on every join and every
//! send, never cached on the connection: participation can be revoked and
//! blocks can be created between connect time and message time, and the room
//! must reflect the current graph on the very next attempt.

use std::sync::Arc;

use crate::store::{ParticipationStore, RelationshipStore};

use super::error::ChatError;

pub struct ChatGate {
    participation: Arc<dyn ParticipationStore>,
    relationships: Arc<dyn RelationshipStore>,
}

impl ChatGate {
    pub fn new(
        participation: Arc<dyn ParticipationStore>,
        relationships: Arc<dyn RelationshipStore>,
    ) -> Self {
        Self {
            participation,
            relationships,
        }
    }

    /// Fails unless (user, match) has a participation row with status
    /// `confirmed`.
    pub async fn assert_confirmed_participant(
        &self,
        user_id: &str,
        match_id: &str,
    ) -> Result<(), ChatError> {
        match self.participation.find_confirmed(user_id, match_id).await? {
            Some(_) => Ok(()),
            None => Err(ChatError::NotAuthorized(
                "You are not a confirmed participant of this match",
            )),
        }
    }

    /// Fails if a blocked relationship exists, in either direction, between
    /// the user and any other confirmed participant. A single blocked pair
    /// excludes the user from the whole room — there is no per-recipient
    /// partial delivery.
    ///
    /// On success returns the other confirmed participants, which the caller
    /// reuses for notification fan-out.
    pub async fn assert_not_blocked_with_participants(
        &self,
        user_id: &str,
        match_id: &str,
    ) -> Result<Vec<String>, ChatError> {
        let others: Vec<String> = self
            .participation
            .list_confirmed_participants(match_id)
            .await?
            .into_iter()
            .filter(|id| id != user_id)
            .collect();

        if self.relationships.any_blocked_with(user_id, &others).await? {
            return Err(ChatError::Blocked(
                "A blocked relationship prevents you from chatting in this match",
            ));
        }

        Ok(others)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::user_match::status;
    use crate::store::MemoryStore;

    fn gate_with(store: Arc<MemoryStore>) -> ChatGate {
        ChatGate::new(store.clone(), store)
    }

    #[tokio::test]
    async fn confirmed_participant_passes() {
        let store = Arc::new(MemoryStore::new());
        store.add_participant("u1", "m1", status::CONFIRMED);

        let gate = gate_with(store);
        assert!(gate.assert_confirmed_participant("u1", "m1").await.is_ok());
    }

    #[tokio::test]
    async fn non_participant_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let gate = gate_with(store);

        let err = gate
            .assert_confirmed_participant("u1", "m1")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn pending_participant_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        store.add_participant("u1", "m1", status::PENDING);

        let gate = gate_with(store);
        let err = gate
            .assert_confirmed_participant("u1", "m1")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn revoked_participation_is_rejected_on_next_check() {
        let store = Arc::new(MemoryStore::new());
        store.add_participant("u1", "m1", status::CONFIRMED);

        let gate = gate_with(store.clone());
        assert!(gate.assert_confirmed_participant("u1", "m1").await.is_ok());

        store.remove_participant("u1", "m1");
        assert!(gate.assert_confirmed_participant("u1", "m1").await.is_err());
    }

    #[tokio::test]
    async fn block_in_either_direction_rejects() {
        for (blocker, blocked) in [("u1", "u2"), ("u2", "u1")] {
            let store = Arc::new(MemoryStore::new());
            store.add_participant("u1", "m1", status::CONFIRMED);
            store.add_participant("u2", "m1", status::CONFIRMED);
            store.add_block(blocker, blocked);

            let gate = gate_with(store);
            let err = gate
                .assert_not_blocked_with_participants("u2", "m1")
                .await
                .unwrap_err();
            assert!(matches!(err, ChatError::Blocked(_)));
        }
    }

    #[tokio::test]
    async fn no_block_returns_other_participants() {
        let store = Arc::new(MemoryStore::new());
        store.add_participant("u1", "m1", status::CONFIRMED);
        store.add_participant("u2", "m1", status::CONFIRMED);
        store.add_participant("u3", "m1", status::CONFIRMED);
        store.add_participant("u4", "m1", status::PENDING);

        let gate = gate_with(store);
        let mut peers = gate
            .assert_not_blocked_with_participants("u1", "m1")
            .await
            .unwrap();
        peers.sort();
        assert_eq!(peers, vec!["u2".to_string(), "u3".to_string()]);
    }

    #[tokio::test]
    async fn block_outside_the_match_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        store.add_participant("u1", "m1", status::CONFIRMED);
        store.add_participant("u2", "m1", status::CONFIRMED);
        // u3 blocked u1 but is not a confirmed participant of m1.
        store.add_block("u3", "u1");

        let gate = gate_with(store);
        assert!(gate
            .assert_not_blocked_with_participants("u1", "m1")
            .await
            .is_ok());
    }
}
