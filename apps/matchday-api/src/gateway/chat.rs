//! The chat broadcast engine.
//!
//! Turns validated send-requests into room-wide deliveries and join/leave
//! announcements. Every action re-runs the authorization gate against durable
//! state; nothing about room access is cached on the connection.

use std::sync::Arc;

use matchday_common::id::{prefix, prefixed_ulid};

use crate::models::notification::kind;
use crate::store::{ParticipationStore, RelationshipStore, StoreError, UserDirectory};

use super::authz::ChatGate;
use super::connections::ConnectionRegistry;
use super::error::ChatError;
use super::events::ServerEvent;
use super::notify::Notifier;
use super::presence::PresenceRegistry;
use super::rooms::RoomRegistry;

/// Maximum message body length after trimming, in characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

pub struct ChatService {
    gate: ChatGate,
    rooms: Arc<RoomRegistry>,
    presence: Arc<PresenceRegistry>,
    connections: Arc<ConnectionRegistry>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<Notifier>,
}

impl ChatService {
    pub fn new(
        participation: Arc<dyn ParticipationStore>,
        relationships: Arc<dyn RelationshipStore>,
        users: Arc<dyn UserDirectory>,
        rooms: Arc<RoomRegistry>,
        presence: Arc<PresenceRegistry>,
        connections: Arc<ConnectionRegistry>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            gate: ChatGate::new(participation, relationships),
            rooms,
            presence,
            connections,
            users,
            notifier,
        }
    }

    /// Admit a connection to a match room after the gate passes, announce the
    /// join to the other members, and send a participant count to the whole
    /// room — the actor treats that as join confirmation.
    pub async fn join_room(
        &self,
        user_id: &str,
        connection_id: &str,
        match_id: &str,
    ) -> Result<(), ChatError> {
        self.gate
            .assert_confirmed_participant(user_id, match_id)
            .await?;
        let peers = self
            .gate
            .assert_not_blocked_with_participants(user_id, match_id)
            .await?;

        let user_name = self
            .users
            .display_name(user_id)
            .await?
            .unwrap_or_else(|| "Unknown".to_string());

        self.rooms.join(connection_id, match_id);

        let members = self.rooms.members_of(match_id);
        self.broadcast(
            &members,
            &ServerEvent::UserJoinedMatch {
                match_id: match_id.to_string(),
                user_id: user_id.to_string(),
                user_name,
            },
            Some(connection_id),
        );
        self.broadcast(
            &members,
            &ServerEvent::ParticipantUpdate {
                match_id: match_id.to_string(),
                participant_count: peers.len() + 1,
            },
            None,
        );

        tracing::info!(user_id, match_id, connection_id, "joined match room");
        Ok(())
    }

    /// Remove a connection from a room and announce the departure to the
    /// remaining members. Leaving requires no authorization and cannot fail.
    pub async fn leave_room(&self, user_id: &str, connection_id: &str, match_id: &str) {
        self.rooms.leave(connection_id, match_id);

        let user_name = self.display_name_or_unknown(user_id).await;
        let members = self.rooms.members_of(match_id);
        self.broadcast(
            &members,
            &ServerEvent::UserLeftMatch {
                match_id: match_id.to_string(),
                user_id: user_id.to_string(),
                user_name,
            },
            None,
        );

        tracing::info!(user_id, match_id, connection_id, "left match room");
    }

    /// Validate, build, and fan out a chat message.
    ///
    /// The member set is read once before iterating, so delivery is
    /// all-or-nothing: every connection in the room at that moment receives
    /// the message, including the sender's own. Afterwards every other
    /// confirmed participant gets a `new_message` notification whether or not
    /// they are currently connected.
    pub async fn post_message(
        &self,
        user_id: &str,
        match_id: &str,
        body: &str,
    ) -> Result<(), ChatError> {
        self.gate
            .assert_confirmed_participant(user_id, match_id)
            .await?;
        let peers = self
            .gate
            .assert_not_blocked_with_participants(user_id, match_id)
            .await?;

        let body = body.trim();
        if body.is_empty() {
            return Err(ChatError::Validation("Message cannot be empty"));
        }
        if body.chars().count() > MAX_MESSAGE_LEN {
            return Err(ChatError::Validation("Message is too long"));
        }

        // Resolved at send time so a renamed sender shows their current name
        // on new messages.
        let user_name = self
            .users
            .display_name(user_id)
            .await?
            .ok_or_else(|| ChatError::Store(StoreError::new("sender user row missing")))?;

        let event = ServerEvent::NewMessage {
            id: prefixed_ulid(prefix::MESSAGE),
            match_id: match_id.to_string(),
            user_id: user_id.to_string(),
            user_name: user_name.clone(),
            message: body.to_string(),
            timestamp: chrono::Utc::now(),
        };

        let members = self.rooms.members_of(match_id);
        self.broadcast(&members, &event, None);

        tracing::info!(
            user_id,
            match_id,
            recipients = members.len(),
            "chat message broadcast"
        );

        // Durable notifications are independent of room membership: offline
        // participants still get one. A notifier fault never fails the send.
        let text = format!("{user_name} sent a message in your match");
        for peer in &peers {
            if let Err(err) = self.notifier.notify(peer, kind::NEW_MESSAGE, &text).await {
                tracing::warn!(%err, recipient_id = %peer, "new_message notification failed");
            }
        }

        Ok(())
    }

    /// Disconnect cleanup: vacate every room the connection was in, announce
    /// each departure, and drop presence and the outbound channel.
    pub async fn disconnect(&self, user_id: &str, connection_id: &str) {
        let vacated = self.rooms.leave_all(connection_id);

        if !vacated.is_empty() {
            let user_name = self.display_name_or_unknown(user_id).await;
            for match_id in &vacated {
                let members = self.rooms.members_of(match_id);
                self.broadcast(
                    &members,
                    &ServerEvent::UserLeftMatch {
                        match_id: match_id.clone(),
                        user_id: user_id.to_string(),
                        user_name: user_name.clone(),
                    },
                    None,
                );
            }
        }

        self.presence.unregister(user_id, connection_id);
        self.connections.remove(connection_id);

        tracing::info!(
            user_id,
            connection_id,
            rooms = vacated.len(),
            "connection cleaned up"
        );
    }

    fn broadcast(&self, members: &[String], event: &ServerEvent, exclude: Option<&str>) {
        for connection_id in members {
            if Some(connection_id.as_str()) == exclude {
                continue;
            }
            self.connections.send_to(connection_id, event.clone());
        }
    }

    /// Best-effort name lookup for informational announcements. Departures
    /// must go through even when the directory is unavailable.
    async fn display_name_or_unknown(&self, user_id: &str) -> String {
        match self.users.display_name(user_id).await {
            Ok(Some(name)) => name,
            Ok(None) => "Unknown".to_string(),
            Err(err) => {
                tracing::warn!(%err, user_id, "display name lookup failed");
                "Unknown".to_string()
            }
        }
    }
}
