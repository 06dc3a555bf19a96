//! WebSocket message protocol definitions
//!
//! ## Client → Server Messages
//!
//! ```json
//! // Subscribe to events
//! {"type": "subscribe", "filter": {"events": ["entity"], "entity_type": "invoice"}}
//!
//! // Unsubscribe
//! {"type": "unsubscribe", "subscription_id": "sub_abc123"}
//!
//! // Keepalive
//! {"type": "ping"}
//! ```
//!
//! ## Server → Client Messages
//!
//! ```json
//! // Event, with the envelope flattened in
//! {"type": "event", "subscription_id": "sub_abc123", "id": "...", "timestamp": "...",
//!  "event": "reminder", "data": {...}}
//!
//! {"type": "welcome", "connection_id": "conn_...", "subscription_id": "sub_..."}
//! {"type": "subscribed", "subscription_id": "sub_abc123", "filter": {...}}
//! {"type": "unsubscribed", "subscription_id": "sub_abc123"}
//! {"type": "pong"}
//! {"type": "error", "message": "Invalid subscription filter"}
//! ```

use crate::core::events::{CrmEvent, EventEnvelope};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events every new connection receives without asking
pub const DEFAULT_EVENTS: &[&str] = &["reminder", "calenderreminder", "notification"];

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { filter: SubscriptionFilter },
    Unsubscribe { subscription_id: String },
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// An event matching a subscription
    Event {
        subscription_id: String,
        #[serde(flatten)]
        envelope: EventEnvelope,
    },
    Subscribed {
        subscription_id: String,
        filter: SubscriptionFilter,
    },
    Unsubscribed {
        subscription_id: String,
    },
    Pong,
    Error {
        message: String,
    },
    /// First message on a connection, naming the default subscription
    Welcome {
        connection_id: String,
        subscription_id: String,
    },
}

/// Filter criteria for event subscriptions
///
/// A `None` field matches everything; set fields are AND-ed.
///
/// ```json
/// {"events": ["reminder", "calenderreminder"]}
/// {"events": ["entity"], "entity_type": "lead", "action": "created"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SubscriptionFilter {
    /// Event names: entity, reminder, calenderreminder, notification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,

    /// Singular record type, e.g. "invoice"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<Uuid>,

    /// created, updated or deleted; only entity events carry one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl SubscriptionFilter {
    /// Filter for the reminder and notification feed
    pub fn default_feed() -> Self {
        Self {
            events: Some(DEFAULT_EVENTS.iter().map(|e| e.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn matches(&self, event: &CrmEvent) -> bool {
        if let Some(ref events) = self.events
            && !events.iter().any(|name| name == event.name())
        {
            return false;
        }

        if let Some(ref entity_type) = self.entity_type
            && event.entity_type() != Some(entity_type.as_str())
        {
            return false;
        }

        if let Some(entity_id) = self.entity_id
            && event.entity_id() != Some(entity_id)
        {
            return false;
        }

        if let Some(ref action) = self.action {
            match event {
                CrmEvent::Entity(e) if e.action() == action => {}
                _ => return false,
            }
        }

        true
    }
}

/// A subscription with its filter and a unique ID
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: String,
    pub filter: SubscriptionFilter,
}

impl Subscription {
    pub fn new(filter: SubscriptionFilter) -> Self {
        Self {
            id: format!("sub_{}", Uuid::new_v4().simple()),
            filter,
        }
    }
}
