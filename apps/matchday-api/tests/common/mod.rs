use std::sync::Arc;

use chrono::Duration;

use matchday_api::auth::tokens;
use matchday_api::config::Config;
use matchday_api::store::MemoryStore;
use matchday_api::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Build an AppState over an in-memory store. Returns the store too so tests
/// can seed users, participations, and blocks.
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    test_state_with_timeout(10)
}

/// Same as [`test_state`] but with a custom handshake deadline, for tests
/// that exercise the timeout close.
pub fn test_state_with_timeout(handshake_timeout_secs: u64) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let config = Config {
        database_url: String::new(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        port: 0,
        handshake_timeout_secs,
    };
    let state = AppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        config,
    );
    (state, store)
}

/// Mint a login token the gateway will accept.
pub fn mint_token(user_id: &str) -> String {
    tokens::sign(user_id, TEST_JWT_SECRET, Duration::minutes(5)).expect("sign token")
}
