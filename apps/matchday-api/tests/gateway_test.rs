mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::time;
use tokio_tungstenite::tungstenite;

use matchday_api::store::{MemoryStore, NotificationStore};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Helper: serve an AppState on a real listener. The server runs in the
/// background.
async fn serve(state: matchday_api::AppState) -> SocketAddr {
    let app = matchday_api::routes::router().with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Helper: start an actual TCP server for WebSocket testing.
/// Returns (addr, store).
async fn start_ws_server() -> (SocketAddr, Arc<MemoryStore>) {
    let (state, store) = common::test_state();
    (serve(state).await, store)
}

async fn ws_connect(addr: SocketAddr) -> WsStream {
    let url = format!("ws://{addr}/gateway");
    let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws_stream
}

async fn send_event(ws: &mut WsStream, event: serde_json::Value) {
    ws.send(tungstenite::Message::Text(event.to_string().into()))
        .await
        .expect("send event");
}

/// Read frames until one carries the given event name. Panics on close or
/// timeout so a missing event fails the test loudly.
async fn read_until(ws: &mut WsStream, event_name: &str) -> serde_json::Value {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap_or_else(|_| panic!("timeout waiting for {event_name}"))
            .expect("stream ended")
            .expect("ws read error");

        let text = match msg {
            tungstenite::Message::Text(t) => t,
            tungstenite::Message::Close(frame) => {
                panic!("closed while waiting for {event_name}: {frame:?}")
            }
            _ => continue,
        };

        let event: serde_json::Value = serde_json::from_str(&text).expect("parse event");
        if event["event"] == event_name {
            return event;
        }
    }
}

/// Helper: connect, authenticate, and read the ready frame.
async fn connect_and_authenticate(addr: SocketAddr, user_id: &str) -> WsStream {
    let mut ws = ws_connect(addr).await;
    let token = common::mint_token(user_id);
    send_event(
        &mut ws,
        serde_json::json!({ "event": "authenticate", "data": { "token": token } }),
    )
    .await;

    let ready = read_until(&mut ws, "ready").await;
    assert_eq!(ready["data"]["userId"], user_id);
    ws
}

/// Helper: join a match room and wait for the confirming participant update.
async fn join_match(ws: &mut WsStream, match_id: &str) {
    send_event(
        ws,
        serde_json::json!({ "event": "joinMatch", "data": { "matchId": match_id } }),
    )
    .await;
    read_until(ws, "participantUpdate").await;
}

async fn expect_close(ws: &mut WsStream, code: u16) {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for close")
            .expect("stream ended")
            .expect("ws read error");

        match msg {
            tungstenite::Message::Close(Some(frame)) => {
                assert_eq!(
                    frame.code,
                    tungstenite::protocol::frame::coding::CloseCode::from(code)
                );
                return;
            }
            tungstenite::Message::Close(None) => return,
            _ => continue,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn authenticate_returns_ready() {
    let (addr, store) = start_ws_server().await;
    store.add_user("usr_ready", "Ana", "Silva");

    let mut ws = ws_connect(addr).await;
    let token = common::mint_token("usr_ready");
    send_event(
        &mut ws,
        serde_json::json!({ "event": "authenticate", "data": { "token": token } }),
    )
    .await;

    let ready = read_until(&mut ws, "ready").await;
    let data = &ready["data"];
    assert!(data["connectionId"].as_str().unwrap().starts_with("conn_"));
    assert_eq!(data["userId"], "usr_ready");
    assert_eq!(data["userName"], "Ana Silva");
}

#[tokio::test]
async fn invalid_token_closes_the_connection() {
    let (addr, _store) = start_ws_server().await;

    let mut ws = ws_connect(addr).await;
    send_event(
        &mut ws,
        serde_json::json!({ "event": "authenticate", "data": { "token": "not-a-jwt" } }),
    )
    .await;

    expect_close(&mut ws, 4001).await;
}

#[tokio::test]
async fn first_frame_must_be_authenticate() {
    let (addr, store) = start_ws_server().await;
    store.add_user("usr_eager", "Ben", "Okafor");

    let mut ws = ws_connect(addr).await;
    send_event(
        &mut ws,
        serde_json::json!({ "event": "joinMatch", "data": { "matchId": "mat_1" } }),
    )
    .await;

    expect_close(&mut ws, 4001).await;
}

#[tokio::test]
async fn silent_handshake_times_out_with_4009() {
    let (state, _store) = common::test_state_with_timeout(1);
    let addr = serve(state).await;

    // Connect and send nothing.
    let mut ws = ws_connect(addr).await;
    expect_close(&mut ws, 4009).await;
}

#[tokio::test]
async fn unknown_frame_gets_an_error_and_the_connection_survives() {
    let (addr, store) = start_ws_server().await;
    store.add_user("usr_a", "Ana", "Silva");
    store.add_participant("usr_a", "mat_1", "confirmed");

    let mut ws = connect_and_authenticate(addr, "usr_a").await;
    send_event(
        &mut ws,
        serde_json::json!({ "event": "selfDestruct", "data": {} }),
    )
    .await;

    let err = read_until(&mut ws, "error").await;
    assert_eq!(err["data"]["code"], "VALIDATION_ERROR");

    // The same socket keeps working afterwards.
    join_match(&mut ws, "mat_1").await;
}

#[tokio::test]
async fn room_members_receive_each_others_messages() {
    let (addr, store) = start_ws_server().await;
    store.add_user("usr_a", "Ana", "Silva");
    store.add_user("usr_b", "Ben", "Okafor");
    store.add_participant("usr_a", "mat_1", "confirmed");
    store.add_participant("usr_b", "mat_1", "confirmed");

    let mut ws_a = connect_and_authenticate(addr, "usr_a").await;
    let mut ws_b = connect_and_authenticate(addr, "usr_b").await;
    join_match(&mut ws_a, "mat_1").await;
    join_match(&mut ws_b, "mat_1").await;

    send_event(
        &mut ws_a,
        serde_json::json!({
            "event": "sendMessage",
            "data": { "matchId": "mat_1", "message": "see you at the pitch" }
        }),
    )
    .await;

    for ws in [&mut ws_a, &mut ws_b] {
        let msg = read_until(ws, "newMessage").await;
        let data = &msg["data"];
        assert!(data["id"].as_str().unwrap().starts_with("msg_"));
        assert_eq!(data["matchId"], "mat_1");
        assert_eq!(data["userId"], "usr_a");
        assert_eq!(data["userName"], "Ana Silva");
        assert_eq!(data["message"], "see you at the pitch");
        assert!(data["timestamp"].is_string());
    }
}

#[tokio::test]
async fn non_participant_join_gets_an_error_frame() {
    let (addr, store) = start_ws_server().await;
    store.add_user("usr_out", "Zed", "Moss");

    let mut ws = connect_and_authenticate(addr, "usr_out").await;
    send_event(
        &mut ws,
        serde_json::json!({ "event": "joinMatch", "data": { "matchId": "mat_1" } }),
    )
    .await;

    let err = read_until(&mut ws, "error").await;
    assert_eq!(err["data"]["code"], "NOT_AUTHORIZED");
}

#[tokio::test]
async fn blocked_sender_gets_an_error_frame() {
    let (addr, store) = start_ws_server().await;
    store.add_user("usr_a", "Ana", "Silva");
    store.add_user("usr_b", "Ben", "Okafor");
    store.add_participant("usr_a", "mat_1", "confirmed");
    store.add_participant("usr_b", "mat_1", "confirmed");

    let mut ws_a = connect_and_authenticate(addr, "usr_a").await;
    let mut ws_b = connect_and_authenticate(addr, "usr_b").await;
    join_match(&mut ws_a, "mat_1").await;
    join_match(&mut ws_b, "mat_1").await;

    store.add_block("usr_b", "usr_a");

    send_event(
        &mut ws_a,
        serde_json::json!({
            "event": "sendMessage",
            "data": { "matchId": "mat_1", "message": "hello?" }
        }),
    )
    .await;

    let err = read_until(&mut ws_a, "error").await;
    assert_eq!(err["data"]["code"], "BLOCKED");
}

#[tokio::test]
async fn notification_is_pushed_to_a_live_connection() {
    let (addr, store) = start_ws_server().await;
    store.add_user("usr_a", "Ana", "Silva");
    store.add_user("usr_b", "Ben", "Okafor");
    store.add_participant("usr_a", "mat_1", "confirmed");
    store.add_participant("usr_b", "mat_1", "confirmed");

    // usr_b is connected but never joins the room.
    let mut ws_a = connect_and_authenticate(addr, "usr_a").await;
    let mut ws_b = connect_and_authenticate(addr, "usr_b").await;
    join_match(&mut ws_a, "mat_1").await;

    send_event(
        &mut ws_a,
        serde_json::json!({
            "event": "sendMessage",
            "data": { "matchId": "mat_1", "message": "kickoff moved to 6pm" }
        }),
    )
    .await;

    let event = read_until(&mut ws_b, "newNotification").await;
    let data = &event["data"];
    assert!(data["id"].as_str().unwrap().starts_with("ntf_"));
    assert_eq!(data["type"], "new_message");
    assert_eq!(data["isRead"], false);

    // The pushed row is durable.
    let rows = store.list_for_user("usr_b", false).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn disconnect_announces_departure_to_the_room() {
    let (addr, store) = start_ws_server().await;
    store.add_user("usr_a", "Ana", "Silva");
    store.add_user("usr_b", "Ben", "Okafor");
    store.add_participant("usr_a", "mat_1", "confirmed");
    store.add_participant("usr_b", "mat_1", "confirmed");

    let mut ws_a = connect_and_authenticate(addr, "usr_a").await;
    let mut ws_b = connect_and_authenticate(addr, "usr_b").await;
    join_match(&mut ws_a, "mat_1").await;
    join_match(&mut ws_b, "mat_1").await;

    drop(ws_b);

    let event = read_until(&mut ws_a, "userLeftMatch").await;
    assert_eq!(event["data"]["matchId"], "mat_1");
    assert_eq!(event["data"]["userId"], "usr_b");
}
