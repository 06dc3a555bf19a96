//! Internal event system for live dashboard updates
//!
//! The EventBus decouples producers (REST handlers, reminder jobs) from the
//! WebSocket fan-out. It uses `tokio::sync::broadcast`.
//!
//! # Architecture
//!
//! ```text
//! REST Handler ───┐
//!                 ├──▶ EventBus::publish() ──▶ broadcast channel ──▶ WebSocket subscribers
//! Reminder jobs ──┘
//! ```
//!
//! # Event names
//!
//! | name               | payload                         |
//! |--------------------|---------------------------------|
//! | `entity`           | [`EntityEvent`]                 |
//! | `reminder`         | [`ReminderEvent`] for invoices  |
//! | `calenderreminder` | [`ReminderEvent`] for events    |
//! | `notification`     | the stored notification record  |
//!
//! The dashboard listens for `calenderreminder` with that spelling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events related to record mutations (create, update, delete)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EntityEvent {
    /// A record was created
    Created {
        entity_type: String,
        entity_id: Uuid,
        data: serde_json::Value,
    },
    /// A record was updated
    Updated {
        entity_type: String,
        entity_id: Uuid,
        data: serde_json::Value,
    },
    /// A record was deleted
    Deleted {
        entity_type: String,
        entity_id: Uuid,
    },
}

impl EntityEvent {
    pub fn entity_type(&self) -> &str {
        match self {
            EntityEvent::Created { entity_type, .. }
            | EntityEvent::Updated { entity_type, .. }
            | EntityEvent::Deleted { entity_type, .. } => entity_type,
        }
    }

    pub fn entity_id(&self) -> Uuid {
        match self {
            EntityEvent::Created { entity_id, .. }
            | EntityEvent::Updated { entity_id, .. }
            | EntityEvent::Deleted { entity_id, .. } => *entity_id,
        }
    }

    /// Get the action name (created, updated, deleted)
    pub fn action(&self) -> &'static str {
        match self {
            EntityEvent::Created { .. } => "created",
            EntityEvent::Updated { .. } => "updated",
            EntityEvent::Deleted { .. } => "deleted",
        }
    }
}

/// Payload of a live reminder push
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEvent {
    /// Id of the stored notification backing this reminder
    pub notification_id: Uuid,
    /// Singular resource name of the record ("invoice", "scheduled_event")
    pub reference_type: String,
    pub reference_id: Uuid,
    pub title: String,
    pub message: String,
    /// "3 Days Before", "1 Day Before", "On Due Date" or "Today"
    pub reminder_type: String,
    pub due_date: DateTime<Utc>,
}

/// Top-level event carried by the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum CrmEvent {
    #[serde(rename = "entity")]
    Entity(EntityEvent),
    /// Unpaid invoice is close to or at its due date
    #[serde(rename = "reminder")]
    InvoiceReminder(ReminderEvent),
    /// Scheduled event happens today
    #[serde(rename = "calenderreminder")]
    CalendarReminder(ReminderEvent),
    /// A notification was added to the feed
    #[serde(rename = "notification")]
    Notification(serde_json::Value),
}

impl CrmEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            CrmEvent::Entity(_) => "entity",
            CrmEvent::InvoiceReminder(_) => "reminder",
            CrmEvent::CalendarReminder(_) => "calenderreminder",
            CrmEvent::Notification(_) => "notification",
        }
    }

    /// Get the entity type this event relates to
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            CrmEvent::Entity(e) => Some(e.entity_type()),
            CrmEvent::InvoiceReminder(r) | CrmEvent::CalendarReminder(r) => {
                Some(&r.reference_type)
            }
            CrmEvent::Notification(_) => Some("notification"),
        }
    }

    /// Get the record ID this event relates to (if applicable)
    pub fn entity_id(&self) -> Option<Uuid> {
        match self {
            CrmEvent::Entity(e) => Some(e.entity_id()),
            CrmEvent::InvoiceReminder(r) | CrmEvent::CalendarReminder(r) => Some(r.reference_id),
            CrmEvent::Notification(doc) => doc
                .get("id")
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok()),
        }
    }
}

/// Envelope wrapping an event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event, flattened into `event` / `data`
    #[serde(flatten)]
    pub event: CrmEvent,
}

impl EventEnvelope {
    /// Create a new event envelope
    pub fn new(event: CrmEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// The bus is cheap to clone (Arc internally) and can be shared across threads.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before
    /// slow receivers start losing events (lagged).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails. Without subscribers the event is dropped.
    /// Returns the number of receivers that will receive the event.
    pub fn publish(&self, event: CrmEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        // send() returns Err only if there are no receivers, which is fine
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Get the current number of active subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reminder() -> ReminderEvent {
        ReminderEvent {
            notification_id: Uuid::new_v4(),
            reference_type: "invoice".to_string(),
            reference_id: Uuid::new_v4(),
            title: "Invoice due".to_string(),
            message: "Invoice for Acme is due".to_string(),
            reminder_type: "1 Day Before".to_string(),
            due_date: Utc::now(),
        }
    }

    #[test]
    fn test_entity_event_serializes_action() {
        let event = EntityEvent::Created {
            entity_type: "lead".to_string(),
            entity_id: Uuid::new_v4(),
            data: json!({"companyName": "Acme"}),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "created");
        assert_eq!(json["entity_type"], "lead");
    }

    #[test]
    fn test_envelope_carries_event_name_and_data() {
        let envelope = EventEnvelope::new(CrmEvent::InvoiceReminder(reminder()));
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["event"], "reminder");
        assert_eq!(json["data"]["reminderType"], "1 Day Before");
        assert!(json["id"].is_string());
    }

    #[test]
    fn test_calendar_event_name_spelling() {
        let event = CrmEvent::CalendarReminder(reminder());
        assert_eq!(event.name(), "calenderreminder");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "calenderreminder");
    }

    #[test]
    fn test_notification_entity_id_from_document() {
        let id = Uuid::new_v4();
        let event = CrmEvent::Notification(json!({"id": id.to_string(), "title": "x"}));
        assert_eq!(event.entity_id(), Some(id));
        assert_eq!(event.entity_type(), Some("notification"));
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let receivers = bus.publish(CrmEvent::CalendarReminder(reminder()));
        assert_eq!(receivers, 1);

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.event.name(), "calenderreminder");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(16);
        assert_eq!(bus.receiver_count(), 0);
        assert_eq!(bus.publish(CrmEvent::Notification(json!({}))), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(CrmEvent::Entity(EntityEvent::Deleted {
            entity_type: "deal".to_string(),
            entity_id: Uuid::new_v4(),
        }));

        assert_eq!(rx1.recv().await.unwrap().event.name(), "entity");
        assert_eq!(rx2.recv().await.unwrap().event.name(), "entity");
    }
}
