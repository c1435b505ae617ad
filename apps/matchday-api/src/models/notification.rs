use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::notifications;

/// Notification type tags created by the rest of the system. Each tag can be
/// disabled per user through `users.notification_preferences`.
pub mod kind {
    pub const NEW_MESSAGE: &str = "new_message";
    pub const FRIEND_REQUEST_RECEIVED: &str = "friend_request_received";
    pub const FRIEND_REQUEST_ACCEPTED: &str = "friend_request_accepted";
    pub const FRIEND_REQUEST_REJECTED: &str = "friend_request_rejected";
    pub const RATING_RECEIVED: &str = "rating_received";
    pub const MATCH_JOINED: &str = "match_joined";
    pub const MATCH_CANCELLED: &str = "match_cancelled";
}

/// A durable notification addressed to one user. The recipient exclusively
/// controls the read/dismissed flags.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = notifications)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[diesel(column_name = type_)]
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub is_dismissed: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable form for creating a notification row.
#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    #[diesel(column_name = type_)]
    pub kind: &'a str,
    pub message: &'a str,
    pub is_read: bool,
    pub is_dismissed: bool,
    pub created_at: DateTime<Utc>,
}
