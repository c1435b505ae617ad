use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::user_matches;

/// Participation status values stored in `user_matches.participation_status`.
pub mod status {
    pub const PENDING: &str = "pending";
    pub const CONFIRMED: &str = "confirmed";
    pub const DECLINED: &str = "declined";
}

/// A user's participation record for a match. At most one row exists per
/// (user, match) pair; only `confirmed` rows authorize chat access.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = user_matches)]
pub struct UserMatch {
    pub user_id: String,
    pub match_id: String,
    pub participation_status: String,
    pub joined_at: DateTime<Utc>,
}
