//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, Timestamp, Username},
    infrastructure::{dto::websocket::ClientEvent, realtime::InboundEvent},
    ui::state::{AppState, ConnectQuery},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> Username (Domain Model)
    let username = match query.username.map(Username::try_from).transpose() {
        Ok(username) => username,
        Err(e) => {
            tracing::warn!("Rejected WebSocket connection: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, username)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, username: Option<Username>) {
    let (mut sender, mut receiver) = socket.split();

    // Bounded queue: a client that cannot keep up is dropped by the hub
    let (tx, mut rx) = mpsc::channel::<String>(state.send_buffer);
    let connection_id = state.hub.register(tx).await;

    if let Some(username) = username {
        apply_event(&state, &connection_id, InboundEvent::UserOnline(username)).await;
    }

    let connection_id_clone = connection_id.clone();
    let state_clone = state.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection_id_clone, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(
                                "Ignoring malformed event from '{}': {}",
                                connection_id_clone,
                                e
                            );
                            continue;
                        }
                    };
                    let event = match InboundEvent::try_from(event) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(
                                "Ignoring invalid event from '{}': {}",
                                connection_id_clone,
                                e
                            );
                            continue;
                        }
                    };
                    if !apply_event(&state_clone, &connection_id_clone, event).await {
                        break;
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to forward hub frames to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        // The hub dropped the queue (slow client or shutdown)
        let _ = sender.close().await;
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    if state.hub.unregister(&connection_id).await {
        tracing::info!("Connection '{}' disconnected", connection_id);
    }
}

/// Forward one client event to the hub.
///
/// `user-online` and `heartbeat` also refresh the user's durable last-seen
/// time. Returns `false` once the hub no longer knows the connection.
async fn apply_event(state: &AppState, connection_id: &ConnectionId, event: InboundEvent) -> bool {
    let online_as = match &event {
        InboundEvent::UserOnline(username) => Some(username.clone()),
        _ => None,
    };
    let is_heartbeat = event == InboundEvent::Heartbeat;

    if let Err(e) = state.hub.handle_event(connection_id, event).await {
        tracing::warn!("{}", e);
        return false;
    }

    let seen = if is_heartbeat {
        state.hub.bound_user(connection_id).await
    } else {
        online_as
    };
    if let Some(username) = seen {
        let now = Timestamp::new(state.clock.now_millis());
        if let Err(e) = state.directory.touch_last_seen(&username, now).await {
            tracing::warn!("Failed to record last seen time of '{}': {}", username, e);
        }
    }
    true
}
