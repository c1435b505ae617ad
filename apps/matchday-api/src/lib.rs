pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use config::Config;
use gateway::chat::ChatService;
use gateway::connections::ConnectionRegistry;
use gateway::notify::Notifier;
use gateway::presence::PresenceRegistry;
use gateway::rooms::RoomRegistry;
use store::{NotificationStore, ParticipationStore, RelationshipStore, UserDirectory};

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserDirectory>,
    pub notifications: Arc<dyn NotificationStore>,
    pub presence: Arc<PresenceRegistry>,
    pub connections: Arc<ConnectionRegistry>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    /// Wire the registries, notifier, and chat engine over the given stores.
    pub fn new(
        participation: Arc<dyn ParticipationStore>,
        relationships: Arc<dyn RelationshipStore>,
        users: Arc<dyn UserDirectory>,
        notifications: Arc<dyn NotificationStore>,
        config: Config,
    ) -> Self {
        let presence = Arc::new(PresenceRegistry::new());
        let rooms = Arc::new(RoomRegistry::new());
        let connections = Arc::new(ConnectionRegistry::new());

        let notifier = Arc::new(Notifier::new(
            users.clone(),
            notifications.clone(),
            presence.clone(),
            connections.clone(),
        ));

        let chat = Arc::new(ChatService::new(
            participation,
            relationships,
            users.clone(),
            rooms,
            presence.clone(),
            connections.clone(),
            notifier,
        ));

        Self {
            config: Arc::new(config),
            users,
            notifications,
            presence,
            connections,
            chat,
        }
    }
}
