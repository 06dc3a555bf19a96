//! Persisted entries of the in-app notification feed

use crate::impl_record;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

impl_record!(
    Notification,
    "notification",
    "notifications",
    label: "Notifications",
    path: "/notifications",
    text: ["title", "message", "kind"],
    numeric: [],
    dates: ["reminderDate"],
    {
        title: String,
        message: String,
        /// Reminder label, e.g. "On Due Date" or "Today"
        kind: String,
        /// Singular resource name of the record the notification is about
        reference_type: String,
        reference_id: Option<Uuid>,
        /// When the reminder fired
        #[serde(deserialize_with = "crate::core::field::lenient::timestamp")]
        reminder_date: Option<DateTime<Utc>>,
        #[serde(deserialize_with = "crate::core::field::lenient::boolean")]
        is_read: bool,
    }
);

/// Identity of a fired reminder: one per record, label and local day
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReminderKey {
    pub reference_id: Uuid,
    pub kind: String,
    pub day: NaiveDate,
}

impl Notification {
    /// Key of the reminder this notification records, if it records one.
    pub fn reminder_key(&self, tz: Tz) -> Option<ReminderKey> {
        let reference_id = self.reference_id?;
        let day = self.reminder_date?.with_timezone(&tz).date_naive();
        Some(ReminderKey {
            reference_id,
            kind: self.kind.clone(),
            day,
        })
    }
}
