//! WebSocket handler for live subscriptions.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tasksync_engine::RemotePath;
use tokio::sync::mpsc;

use crate::websocket::{ClientMessage, ServerMessage};
use crate::AppState;

/// Handle an established WebSocket connection.
///
/// This function:
/// 1. Registers the connection with the manager
/// 2. Spawns a task to forward outgoing messages
/// 3. Processes incoming messages in a loop
/// 4. Cleans up on disconnect
pub async fn handle_websocket_connection(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let conn_id = state.conn_manager.register(tx);

    tracing::info!(conn_id = %conn_id, "WebSocket client connected");

    // Forward messages from the channel to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
                        tracing::warn!("Failed to send WebSocket message: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize WebSocket message: {}", e);
                }
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Some(response) = process_message(text.as_str(), &state, &conn_id).await {
                    state.conn_manager.send_to(&conn_id, response);
                }
            }
            Ok(Message::Binary(_)) => {
                tracing::warn!("Binary messages not supported");
            }
            Ok(Message::Ping(data)) => {
                tracing::trace!("Received ping: {} bytes", data.len());
            }
            Ok(Message::Pong(_)) => {
                tracing::trace!("Received pong");
            }
            Ok(Message::Close(_)) => {
                tracing::info!(conn_id = %conn_id, "WebSocket close frame received");
                break;
            }
            Err(e) => {
                tracing::warn!(conn_id = %conn_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    state.conn_manager.unregister(&conn_id);
    send_task.abort();

    tracing::info!(
        conn_id = %conn_id,
        active_connections = state.conn_manager.connection_count(),
        "WebSocket client disconnected"
    );
}

/// Process a client message. Returns the reply, if any.
async fn process_message(text: &str, state: &AppState, conn_id: &str) -> Option<ServerMessage> {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            return Some(ServerMessage::error(
                format!("Invalid message format: {}", e),
                None,
            ));
        }
    };

    match client_msg {
        ClientMessage::Subscribe { path, request_id } => {
            let path = match RemotePath::parse(&path) {
                Ok(path) => path,
                Err(e) => return Some(ServerMessage::error(e.to_string(), request_id)),
            };

            // Hold the read lock so no change slips between the initial
            // snapshot and the registration
            let tree = state.tree.read().await;
            let subscription_id = state.conn_manager.subscribe(conn_id, path.clone());
            state.conn_manager.send_to(
                conn_id,
                ServerMessage::Subscribed {
                    subscription_id: subscription_id.clone(),
                    request_id,
                },
            );
            state.conn_manager.send_to(
                conn_id,
                ServerMessage::snapshot(subscription_id, path.to_string(), tree.get(&path)),
            );
            None
        }

        ClientMessage::Unsubscribe {
            subscription_id,
            request_id,
        } => {
            if state.conn_manager.unsubscribe(conn_id, &subscription_id) {
                Some(ServerMessage::Unsubscribed {
                    subscription_id,
                    request_id,
                })
            } else {
                Some(ServerMessage::error(
                    format!("Unknown subscription '{}'", subscription_id),
                    request_id,
                ))
            }
        }

        ClientMessage::Ping => Some(ServerMessage::Pong),
    }
}
