//! WebSocket upgrade handler and per-connection event loop.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time;

use matchday_common::id::{prefix, prefixed_ulid};

use crate::auth::tokens;
use crate::AppState;

use super::events::{ClientEvent, ServerEvent};
use super::session::Session;

/// Close codes (4000-range for application-level).
const CLOSE_AUTH_FAILED: u16 = 4001;
const CLOSE_HANDSHAKE_TIMEOUT: u16 = 4009;

pub fn router() -> Router<AppState> {
    Router::new().route("/gateway", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Step 1: the first frame must be an authenticate event, within the
    // configured deadline. Nothing else is processed before it.
    let deadline = Duration::from_secs(state.config.handshake_timeout_secs);
    let token_result = time::timeout(deadline, async {
        while let Some(msg) = ws_rx.next().await {
            let msg = match msg {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(?e, "ws read error during handshake");
                    return Err("read error");
                }
            };

            let text = match msg {
                Message::Text(t) => t,
                Message::Close(_) => return Err("client closed"),
                Message::Ping(_) | Message::Pong(_) => continue,
                _ => continue,
            };

            return match serde_json::from_str::<ClientEvent>(&text) {
                Ok(ClientEvent::Authenticate { token }) => Ok(token),
                Ok(_) => Err("expected authenticate"),
                Err(_) => Err("invalid json"),
            };
        }
        Err("connection closed before authenticate")
    })
    .await;

    let token = match token_result {
        Ok(Ok(token)) => token,
        Ok(Err(reason)) => {
            tracing::debug!(%reason, "handshake failed");
            let _ = send_close(&mut ws_tx, CLOSE_AUTH_FAILED, reason).await;
            return;
        }
        Err(_timeout) => {
            let _ = send_close(&mut ws_tx, CLOSE_HANDSHAKE_TIMEOUT, "Handshake timeout").await;
            return;
        }
    };

    // Step 2: verify the token and resolve the user before registering
    // anything. A bad token leaves no trace in the registries.
    let claims = match tokens::verify(&token, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(?e, "token verification failed");
            let _ = send_close(&mut ws_tx, CLOSE_AUTH_FAILED, "Invalid or expired token").await;
            return;
        }
    };

    let user_name = match state.users.display_name(&claims.user_id).await {
        Ok(Some(name)) => name,
        Ok(None) => {
            let _ = send_close(&mut ws_tx, CLOSE_AUTH_FAILED, "Unknown user").await;
            return;
        }
        Err(err) => {
            tracing::error!(%err, "user lookup failed during handshake");
            let _ = send_close(&mut ws_tx, CLOSE_AUTH_FAILED, "Authentication failed").await;
            return;
        }
    };

    let session = Session::new(
        prefixed_ulid(prefix::CONNECTION),
        claims.user_id,
        user_name,
    );

    // Step 3: register the outbound channel and presence, then confirm.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerEvent>();
    state.connections.insert(&session.connection_id, out_tx.clone());
    state.presence.register(&session.user_id, &session.connection_id);

    tracing::info!(
        connection_id = %session.connection_id,
        user_id = %session.user_id,
        "gateway connection established"
    );

    let ready = ServerEvent::Ready {
        connection_id: session.connection_id.clone(),
        user_id: session.user_id.clone(),
        user_name: session.user_name.clone(),
    };
    let ready_json = serde_json::to_string(&ready).unwrap();
    if ws_tx.send(Message::Text(ready_json.into())).await.is_err() {
        state.chat.disconnect(&session.user_id, &session.connection_id).await;
        return;
    }

    // Step 4: main loop. Client frames drive actions; queued events drain to
    // the socket in order.
    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let event: ClientEvent = match serde_json::from_str(&text) {
                            Ok(event) => event,
                            Err(_) => {
                                let _ = out_tx.send(ServerEvent::error(
                                    "VALIDATION_ERROR",
                                    "Invalid event payload",
                                ));
                                continue;
                            }
                        };
                        handle_client_event(&state, &session, &out_tx, event).await;
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, connection_id = %session.connection_id, "ws read error");
                        break;
                    }
                    _ => continue,
                }
            }

            event = out_rx.recv() => {
                match event {
                    Some(event) => {
                        let json = serde_json::to_string(&event).unwrap();
                        if ws_tx.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    state.chat.disconnect(&session.user_id, &session.connection_id).await;

    tracing::info!(
        connection_id = %session.connection_id,
        user_id = %session.user_id,
        "gateway connection closed"
    );
}

/// Dispatch one authenticated client event. Action failures are reported to
/// the sender as error frames; the connection stays open.
async fn handle_client_event(
    state: &AppState,
    session: &Session,
    out_tx: &mpsc::UnboundedSender<ServerEvent>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Authenticate { .. } => {
            let _ = out_tx.send(ServerEvent::error(
                "VALIDATION_ERROR",
                "Already authenticated",
            ));
        }
        ClientEvent::JoinMatch { match_id } => {
            if let Err(err) = state
                .chat
                .join_room(&session.user_id, &session.connection_id, &match_id)
                .await
            {
                let _ = out_tx.send(err.into_event());
            }
        }
        ClientEvent::LeaveMatch { match_id } => {
            state
                .chat
                .leave_room(&session.user_id, &session.connection_id, &match_id)
                .await;
        }
        ClientEvent::SendMessage { match_id, message } => {
            if let Err(err) = state
                .chat
                .post_message(&session.user_id, &match_id, &message)
                .await
            {
                let _ = out_tx.send(err.into_event());
            }
        }
    }
}

/// Send a WebSocket close frame with a code and reason.
async fn send_close(
    ws_tx: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    code: u16,
    reason: &str,
) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(axum::extract::ws::CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}
