//! Per-connection session state.

/// Identity attached to a WebSocket connection once the handshake completes.
pub struct Session {
    /// Unique connection identifier (`conn_` prefixed ULID).
    pub connection_id: String,
    /// Authenticated user ID.
    pub user_id: String,
    /// Display name cached at handshake time, used only for the ready frame.
    pub user_name: String,
}

impl Session {
    pub fn new(connection_id: String, user_id: String, user_name: String) -> Self {
        Self {
            connection_id,
            user_id,
            user_name,
        }
    }
}
