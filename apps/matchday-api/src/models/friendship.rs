use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::friendships;

/// Relationship status values stored in `friendships.status`.
///
/// A `blocked` row in either direction is treated as mutually blocking.
pub mod status {
    pub const PENDING: &str = "pending";
    pub const ACCEPTED: &str = "accepted";
    pub const REJECTED: &str = "rejected";
    pub const BLOCKED: &str = "blocked";
}

/// A directional relationship row between two users.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = friendships)]
pub struct Friendship {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
