//! Storage interfaces consumed by the chat and notification core.
//!
//! Each concern is a trait object so the gateway can be driven by Postgres in
//! production and by an in-memory store in tests.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::models::notification::Notification;
use crate::models::user_match::UserMatch;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence failure. The message is logged server-side; callers surface a
/// generic error to the client and never retry automatically.
#[derive(Debug)]
pub struct StoreError(String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        Self(err.to_string())
    }
}

impl From<diesel_async::pooled_connection::deadpool::PoolError> for StoreError {
    fn from(err: diesel_async::pooled_connection::deadpool::PoolError) -> Self {
        Self(err.to_string())
    }
}

/// Authoritative record of who participates in which match.
#[async_trait]
pub trait ParticipationStore: Send + Sync {
    /// Find the participation row for (user, match) with status `confirmed`.
    async fn find_confirmed(
        &self,
        user_id: &str,
        match_id: &str,
    ) -> Result<Option<UserMatch>, StoreError>;

    /// All user ids with a confirmed participation in the match.
    async fn list_confirmed_participants(&self, match_id: &str)
        -> Result<Vec<String>, StoreError>;
}

/// Friendship/block relationships between users.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Whether a blocked row exists between `user_id` and any of `others`,
    /// in either direction.
    async fn any_blocked_with(
        &self,
        user_id: &str,
        others: &[String],
    ) -> Result<bool, StoreError>;
}

/// Read-only user lookups needed by the gateway.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// The user's current display name, or `None` if the user does not exist.
    /// Resolved fresh per event so renames show up on new messages.
    async fn display_name(&self, user_id: &str) -> Result<Option<String>, StoreError>;

    /// The user's notification preference map, or `None` if the user does not
    /// exist. A missing key means the type is enabled.
    async fn notification_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<HashMap<String, bool>>, StoreError>;
}

/// Durable notification rows.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(
        &self,
        user_id: &str,
        kind: &str,
        message: &str,
    ) -> Result<Notification, StoreError>;

    async fn find(&self, id: &str, user_id: &str) -> Result<Option<Notification>, StoreError>;

    /// Notifications for a user, newest first.
    async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError>;

    async fn mark_read(&self, id: &str, user_id: &str)
        -> Result<Option<Notification>, StoreError>;

    async fn dismiss(&self, id: &str, user_id: &str) -> Result<Option<Notification>, StoreError>;

    /// Returns `true` if a row was deleted.
    async fn delete(&self, id: &str, user_id: &str) -> Result<bool, StoreError>;
}

/// Parse a stored JSONB preference object into a map. Non-boolean values are
/// ignored rather than rejected.
pub(crate) fn preferences_from_json(value: Option<&serde_json::Value>) -> HashMap<String, bool> {
    let mut map = HashMap::new();
    if let Some(serde_json::Value::Object(obj)) = value {
        for (key, val) in obj {
            if let serde_json::Value::Bool(b) = val {
                map.insert(key.clone(), *b);
            }
        }
    }
    map
}
