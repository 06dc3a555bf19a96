//! `/ws` upgrade and the per-connection loops
//!
//! A connection is registered (already subscribed to the reminder feed),
//! greeted, then served by two halves: a spawned writer draining the
//! manager's queue and a reader handling subscribe/unsubscribe/ping.

use super::manager::ConnectionManager;
use super::protocol::{ClientMessage, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use std::sync::Arc;
use tokio::sync::mpsc;

type Outgoing = SplitSink<WebSocket, Message>;

/// GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(manager): State<Arc<ConnectionManager>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, manager))
}

async fn handle_socket(socket: WebSocket, manager: Arc<ConnectionManager>) {
    let connection = manager.connect().await;
    let conn_id = connection.id;
    let (mut outgoing, mut incoming) = socket.split();

    let welcome = ServerMessage::Welcome {
        connection_id: conn_id.clone(),
        subscription_id: connection.default_subscription,
    };
    if !send_message(&mut outgoing, &welcome, &conn_id).await {
        manager.disconnect(&conn_id).await;
        return;
    }

    let writer = tokio::spawn(forward_queue(outgoing, connection.rx, conn_id.clone()));

    while let Some(frame) = incoming.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let reply = reply_to(&manager, &conn_id, &text).await;
                manager.send_to(&conn_id, reply).await;
            }
            Ok(Message::Close(_)) => break,
            // pings are answered by axum; binary frames are ignored
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection_id = %conn_id, error = %e, "WebSocket read error");
                break;
            }
        }
    }

    writer.abort();
    manager.disconnect(&conn_id).await;
}

/// Drain the connection's queue into the socket until either side closes.
async fn forward_queue(
    mut outgoing: Outgoing,
    mut queue: mpsc::UnboundedReceiver<ServerMessage>,
    conn_id: String,
) {
    while let Some(message) = queue.recv().await {
        if !send_message(&mut outgoing, &message, &conn_id).await {
            break;
        }
    }
}

/// Returns false once the socket can no longer be written.
async fn send_message(outgoing: &mut Outgoing, message: &ServerMessage, conn_id: &str) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(connection_id = %conn_id, error = %e, "failed to encode server message");
            return true;
        }
    };
    if outgoing.send(Message::Text(json.into())).await.is_err() {
        tracing::debug!(connection_id = %conn_id, "WebSocket write failed, closing");
        return false;
    }
    true
}

async fn reply_to(manager: &ConnectionManager, connection_id: &str, text: &str) -> ServerMessage {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            return ServerMessage::Error {
                message: format!("Invalid message: {}", e),
            };
        }
    };

    match message {
        ClientMessage::Ping => ServerMessage::Pong,
        ClientMessage::Subscribe { filter } => {
            match manager.subscribe(connection_id, filter.clone()).await {
                Ok(subscription_id) => ServerMessage::Subscribed {
                    subscription_id,
                    filter,
                },
                Err(message) => ServerMessage::Error { message },
            }
        }
        ClientMessage::Unsubscribe { subscription_id } => {
            match manager.unsubscribe(connection_id, &subscription_id).await {
                Ok(true) => ServerMessage::Unsubscribed { subscription_id },
                Ok(false) => ServerMessage::Error {
                    message: format!("Subscription {} not found", subscription_id),
                },
                Err(message) => ServerMessage::Error { message },
            }
        }
    }
}
