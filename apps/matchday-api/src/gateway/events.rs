//! Wire-format events exchanged with clients over the WebSocket.
//!
//! Every frame is a tagged JSON object: `{"event": <name>, "data": {…}}`.
//! Payloads are validated on receipt before any dispatch happens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::notification::Notification;

/// A frame received from a client.
#[derive(Debug, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// First frame on every connection; carries the login JWT.
    Authenticate { token: String },
    JoinMatch { match_id: String },
    LeaveMatch { match_id: String },
    SendMessage { match_id: String, message: String },
}

/// A frame pushed to a client.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Handshake confirmation; absence of this event means the connection
    /// was refused.
    Ready {
        connection_id: String,
        user_id: String,
        user_name: String,
    },
    NewMessage {
        id: String,
        match_id: String,
        user_id: String,
        user_name: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    UserJoinedMatch {
        match_id: String,
        user_id: String,
        user_name: String,
    },
    UserLeftMatch {
        match_id: String,
        user_id: String,
        user_name: String,
    },
    ParticipantUpdate {
        match_id: String,
        participant_count: usize,
    },
    NewNotification {
        id: String,
        #[serde(rename = "type")]
        kind: String,
        message: String,
        is_read: bool,
        is_dismissed: bool,
        created_at: DateTime<Utc>,
    },
    /// Delivered to the acting connection only; never broadcast to a room.
    Error { code: String, message: String },
}

impl ServerEvent {
    pub fn new_notification(notification: &Notification) -> Self {
        Self::NewNotification {
            id: notification.id.clone(),
            kind: notification.kind.clone(),
            message: notification.message.clone(),
            is_read: notification.is_read,
            is_dismissed: notification.is_dismissed,
            created_at: notification.created_at,
        }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}
