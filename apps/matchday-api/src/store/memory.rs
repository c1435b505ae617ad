//! In-memory store used by tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use matchday_common::id::{prefix, prefixed_ulid};

use crate::models::friendship::{status as friendship_status, Friendship};
use crate::models::notification::Notification;
use crate::models::user_match::UserMatch;

use super::{
    NotificationStore, ParticipationStore, RelationshipStore, StoreError, UserDirectory,
};

struct MemoryUser {
    first_name: String,
    last_name: String,
    preferences: HashMap<String, bool>,
}

/// One struct implements every store interface, like [`super::PgStore`].
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, MemoryUser>>,
    participations: Mutex<Vec<UserMatch>>,
    friendships: Mutex<Vec<Friendship>>,
    notifications: Mutex<Vec<Notification>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: &str, first_name: &str, last_name: &str) {
        self.users.lock().unwrap().insert(
            id.to_string(),
            MemoryUser {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                preferences: HashMap::new(),
            },
        );
    }

    /// Change a user's name without touching their preferences.
    pub fn rename_user(&self, id: &str, first_name: &str, last_name: &str) {
        if let Some(user) = self.users.lock().unwrap().get_mut(id) {
            user.first_name = first_name.to_string();
            user.last_name = last_name.to_string();
        }
    }

    pub fn set_preference(&self, user_id: &str, kind: &str, enabled: bool) {
        if let Some(user) = self.users.lock().unwrap().get_mut(user_id) {
            user.preferences.insert(kind.to_string(), enabled);
        }
    }

    pub fn add_participant(&self, user_id: &str, match_id: &str, status: &str) {
        let mut rows = self.participations.lock().unwrap();
        rows.retain(|p| !(p.user_id == user_id && p.match_id == match_id));
        rows.push(UserMatch {
            user_id: user_id.to_string(),
            match_id: match_id.to_string(),
            participation_status: status.to_string(),
            joined_at: Utc::now(),
        });
    }

    pub fn remove_participant(&self, user_id: &str, match_id: &str) {
        self.participations
            .lock()
            .unwrap()
            .retain(|p| !(p.user_id == user_id && p.match_id == match_id));
    }

    pub fn add_friendship(&self, sender_id: &str, receiver_id: &str, status: &str) {
        self.friendships.lock().unwrap().push(Friendship {
            id: prefixed_ulid(prefix::FRIENDSHIP),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            status: status.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    pub fn add_block(&self, sender_id: &str, receiver_id: &str) {
        self.add_friendship(sender_id, receiver_id, friendship_status::BLOCKED);
    }
}

#[async_trait]
impl ParticipationStore for MemoryStore {
    async fn find_confirmed(
        &self,
        user_id: &str,
        match_id: &str,
    ) -> Result<Option<UserMatch>, StoreError> {
        Ok(self
            .participations
            .lock()
            .unwrap()
            .iter()
            .find(|p| {
                p.user_id == user_id
                    && p.match_id == match_id
                    && p.participation_status == crate::models::user_match::status::CONFIRMED
            })
            .cloned())
    }

    async fn list_confirmed_participants(
        &self,
        match_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        Ok(self
            .participations
            .lock()
            .unwrap()
            .iter()
            .filter(|p| {
                p.match_id == match_id
                    && p.participation_status == crate::models::user_match::status::CONFIRMED
            })
            .map(|p| p.user_id.clone())
            .collect())
    }
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    async fn any_blocked_with(
        &self,
        user_id: &str,
        others: &[String],
    ) -> Result<bool, StoreError> {
        Ok(self.friendships.lock().unwrap().iter().any(|f| {
            f.status == friendship_status::BLOCKED
                && ((f.sender_id == user_id && others.contains(&f.receiver_id))
                    || (f.receiver_id == user_id && others.contains(&f.sender_id)))
        }))
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn display_name(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(user_id)
            .map(|u| format!("{} {}", u.first_name, u.last_name)))
    }

    async fn notification_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<HashMap<String, bool>>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(user_id)
            .map(|u| u.preferences.clone()))
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(
        &self,
        user_id: &str,
        kind: &str,
        message: &str,
    ) -> Result<Notification, StoreError> {
        let row = Notification {
            id: prefixed_ulid(prefix::NOTIFICATION),
            user_id: user_id.to_string(),
            kind: kind.to_string(),
            message: message.to_string(),
            is_read: false,
            is_dismissed: false,
            created_at: Utc::now(),
        };
        self.notifications.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn find(&self, id: &str, user_id: &str) -> Result<Option<Notification>, StoreError> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == id && n.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut rows: Vec<Notification> = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn mark_read(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Notification>, StoreError> {
        let mut rows = self.notifications.lock().unwrap();
        match rows.iter_mut().find(|n| n.id == id && n.user_id == user_id) {
            Some(row) => {
                row.is_read = true;
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn dismiss(&self, id: &str, user_id: &str) -> Result<Option<Notification>, StoreError> {
        let mut rows = self.notifications.lock().unwrap();
        match rows.iter_mut().find(|n| n.id == id && n.user_id == user_id) {
            Some(row) => {
                row.is_dismissed = true;
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<bool, StoreError> {
        let mut rows = self.notifications.lock().unwrap();
        let before = rows.len();
        rows.retain(|n| !(n.id == id && n.user_id == user_id));
        Ok(rows.len() < before)
    }
}
