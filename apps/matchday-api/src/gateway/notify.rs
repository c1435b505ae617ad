//! Durable notification creation plus best-effort live push.
//!
//! Any domain event addressed to a user funnels through [`Notifier::notify`]:
//! REST controllers (ratings, friend requests) and the chat engine alike.
//! The durable write happens-before the push, so a client that receives a
//! `newNotification` event can immediately fetch the row by id.

use std::sync::Arc;

use crate::models::notification::Notification;
use crate::store::{NotificationStore, StoreError, UserDirectory};

use super::connections::ConnectionRegistry;
use super::events::ServerEvent;
use super::presence::PresenceRegistry;

pub struct Notifier {
    users: Arc<dyn UserDirectory>,
    store: Arc<dyn NotificationStore>,
    presence: Arc<PresenceRegistry>,
    connections: Arc<ConnectionRegistry>,
}

impl Notifier {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        store: Arc<dyn NotificationStore>,
        presence: Arc<PresenceRegistry>,
        connections: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            users,
            store,
            presence,
            connections,
        }
    }

    /// Create a notification for a user and push it to each of their live
    /// connections. Returns `None` when the recipient opted out of this type
    /// or does not exist — no row is created and nothing is pushed.
    pub async fn notify(
        &self,
        recipient_id: &str,
        kind: &str,
        message: &str,
    ) -> Result<Option<Notification>, StoreError> {
        let preferences = match self.users.notification_preferences(recipient_id).await? {
            Some(preferences) => preferences,
            None => {
                tracing::warn!(recipient_id, "notification recipient not found");
                return Ok(None);
            }
        };

        // A missing key means enabled; only an explicit `false` opts out.
        if preferences.get(kind) == Some(&false) {
            tracing::debug!(recipient_id, kind, "notification type disabled by recipient");
            return Ok(None);
        }

        let notification = self.store.create(recipient_id, kind, message).await?;

        // Row persisted; push to every live connection. An empty set just
        // means the recipient will find the row when they next fetch.
        for connection_id in self.presence.connections_for(recipient_id) {
            self.connections
                .send_to(&connection_id, ServerEvent::new_notification(&notification));
        }

        tracing::info!(
            recipient_id,
            kind,
            notification_id = %notification.id,
            "notification created"
        );

        Ok(Some(notification))
    }
}
