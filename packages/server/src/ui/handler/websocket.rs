//! WebSocket relay gateway: connection lifecycle and event dispatch.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, Identity, Mode, RoomId, Topic},
    engine::{EngineError, PusherChannel},
    protocol::{ClientEvent, ServerEvent},
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives serialized events from the rx channel and
/// pushes them down the WebSocket to this client.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Every socket gets a server-minted connection id; display
    // identities arrive later, inside events.
    let conn = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    {
        let now = state.clock.now_millis();
        let mut engine = state.engine.lock().await;
        engine.register_conn(conn.clone(), tx.clone(), now);
    }
    tracing::info!("Connection '{}' established", conn);

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let conn_recv = conn.clone();
    let state_recv = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", conn_recv, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch_event(&state_recv, &conn_recv, &tx, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping from '{}'", conn_recv);
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", conn_recv);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Teardown: pool entry, room memberships, departure announcements.
    let now = state.clock.now_millis();
    let mut engine = state.engine.lock().await;
    engine.disconnect(&conn, now);
}

/// Parse one inbound frame and drive the engine. Malformed or invalid
/// events produce an informational `error` event; the connection stays
/// open.
async fn dispatch_event(state: &Arc<AppState>, conn: &ConnectionId, tx: &PusherChannel, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Malformed event from '{}': {}", conn, e);
            push_error(tx, format!("malformed event: {e}"));
            return;
        }
    };

    let now = state.clock.now_millis();
    match event {
        ClientEvent::JoinWaitingRoom {
            identity,
            topic,
            mode,
        } => {
            let identity = match Identity::try_from(identity) {
                Ok(v) => v,
                Err(e) => return push_error(tx, e.to_string()),
            };
            let topic = match Topic::try_from(topic) {
                Ok(v) => v,
                Err(e) => return push_error(tx, e.to_string()),
            };
            let mode = match mode.parse::<Mode>() {
                Ok(v) => v,
                Err(e) => return push_error(tx, e.to_string()),
            };

            let mut engine = state.engine.lock().await;
            if let Err(e) = engine.join_waiting(conn, identity, topic, mode, now) {
                tracing::warn!("join_waiting failed for '{}': {}", conn, e);
            }
        }
        ClientEvent::JoinRoom { room_id, identity } => {
            let room_id = match RoomId::try_from(room_id) {
                Ok(v) => v,
                Err(e) => return push_error(tx, e.to_string()),
            };
            let identity = match Identity::try_from(identity) {
                Ok(v) => v,
                Err(e) => return push_error(tx, e.to_string()),
            };

            let mut engine = state.engine.lock().await;
            match engine.join_room(conn, room_id, identity, now) {
                Ok(()) => {}
                Err(e @ EngineError::RoomFull(_)) => push_error(tx, e.to_string()),
                Err(e) => tracing::warn!("join_room failed for '{}': {}", conn, e),
            }
        }
        ClientEvent::SendMessage {
            room_id,
            sender,
            text,
            identity,
        } => {
            let room_id = match RoomId::try_from(room_id) {
                Ok(v) => v,
                Err(e) => return push_error(tx, e.to_string()),
            };

            let mut engine = state.engine.lock().await;
            engine.send_message(room_id, sender, identity, text, now);
        }
    }
}

fn push_error(tx: &PusherChannel, message: String) {
    let json = serde_json::to_string(&ServerEvent::error(message))
        .expect("ServerEvent serialization cannot fail");
    // The pusher loop may already be gone; nothing else to do then.
    let _ = tx.send(json);
}
