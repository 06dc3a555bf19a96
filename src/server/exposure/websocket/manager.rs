//! Connection manager for WebSocket clients
//!
//! Tracks live connections and their subscriptions and fans out every bus
//! event to the subscriptions whose filter matches.
//!
//! ```text
//! EventBus ──recv──▶ ConnectionManager::run_dispatch_loop()
//!                          │
//!                    for each connection
//!                          │
//!                    for each subscription
//!                          │
//!                    filter.matches(event)?
//!                          │
//!                    ──yes──▶ send to client via mpsc channel
//! ```

use super::protocol::{ServerMessage, Subscription, SubscriptionFilter};
use crate::core::events::EventEnvelope;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, mpsc};
use uuid::Uuid;

struct ConnectionHandle {
    /// Feeds the client's write loop
    tx: mpsc::UnboundedSender<ServerMessage>,
    subscriptions: Vec<Subscription>,
}

/// A freshly registered connection
pub struct Connection {
    pub id: String,
    /// Subscription to the reminder and notification feed
    pub default_subscription: String,
    pub rx: mpsc::UnboundedReceiver<ServerMessage>,
}

/// All live WebSocket connections
#[derive(Default)]
pub struct ConnectionManager {
    connections: RwLock<HashMap<String, ConnectionHandle>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, already subscribed to the default feed.
    pub async fn connect(&self) -> Connection {
        let id = format!("conn_{}", Uuid::new_v4().simple());
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = Subscription::new(SubscriptionFilter::default_feed());
        let default_subscription = subscription.id.clone();

        self.connections.write().await.insert(
            id.clone(),
            ConnectionHandle {
                tx,
                subscriptions: vec![subscription],
            },
        );

        tracing::debug!(connection_id = %id, "WebSocket client connected");

        Connection {
            id,
            default_subscription,
            rx,
        }
    }

    pub async fn disconnect(&self, connection_id: &str) {
        self.connections.write().await.remove(connection_id);
        tracing::debug!(connection_id = %connection_id, "WebSocket client disconnected");
    }

    /// Add a subscription; errors when the connection is gone.
    pub async fn subscribe(
        &self,
        connection_id: &str,
        filter: SubscriptionFilter,
    ) -> Result<String, String> {
        let mut connections = self.connections.write().await;
        let conn = connections
            .get_mut(connection_id)
            .ok_or_else(|| format!("Connection {} not found", connection_id))?;

        let subscription = Subscription::new(filter);
        let sub_id = subscription.id.clone();
        conn.subscriptions.push(subscription);

        tracing::debug!(
            connection_id = %connection_id,
            subscription_id = %sub_id,
            "Subscription added"
        );

        Ok(sub_id)
    }

    /// Returns `true` if the subscription was found and removed.
    pub async fn unsubscribe(
        &self,
        connection_id: &str,
        subscription_id: &str,
    ) -> Result<bool, String> {
        let mut connections = self.connections.write().await;
        let conn = connections
            .get_mut(connection_id)
            .ok_or_else(|| format!("Connection {} not found", connection_id))?;

        let before = conn.subscriptions.len();
        conn.subscriptions.retain(|s| s.id != subscription_id);
        Ok(conn.subscriptions.len() < before)
    }

    pub async fn send_to(&self, connection_id: &str, message: ServerMessage) {
        let connections = self.connections.read().await;
        if let Some(conn) = connections.get(connection_id) {
            // a failed send means the client already left
            let _ = conn.tx.send(message);
        }
    }

    /// Deliver an event once per matching subscription.
    async fn dispatch_event(&self, envelope: &EventEnvelope) {
        let connections = self.connections.read().await;

        for (connection_id, handle) in connections.iter() {
            for subscription in &handle.subscriptions {
                if !subscription.filter.matches(&envelope.event) {
                    continue;
                }
                let message = ServerMessage::Event {
                    subscription_id: subscription.id.clone(),
                    envelope: envelope.clone(),
                };
                if handle.tx.send(message).is_err() {
                    tracing::debug!(
                        connection_id = %connection_id,
                        "Failed to send event to connection (likely disconnected)"
                    );
                    break;
                }
            }
        }
    }

    /// Forward bus events until the bus closes.
    pub async fn run_dispatch_loop(self: Arc<Self>, mut rx: broadcast::Receiver<EventEnvelope>) {
        tracing::info!("WebSocket dispatch loop started");

        loop {
            match rx.recv().await {
                Ok(envelope) => self.dispatch_event(&envelope).await,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    tracing::warn!(count, "WebSocket dispatch loop lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("EventBus closed, stopping WebSocket dispatch loop");
                    break;
                }
            }
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
