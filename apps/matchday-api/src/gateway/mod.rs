//! Real-time gateway: WebSocket transport, match chat rooms, presence, and
//! notification delivery.

pub mod authz;
pub mod chat;
pub mod connections;
pub mod error;
pub mod events;
pub mod notify;
pub mod presence;
pub mod rooms;
pub mod server;
pub mod session;
