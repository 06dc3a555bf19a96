//! Calendar entries that drive the calendar reminder job

use crate::core::field::{DateValue, is_email};
use crate::impl_record;

impl_record!(
    ScheduledEvent,
    "scheduled_event",
    "scheduled_events",
    label: "Scheduled Events",
    path: "/calendar",
    text: ["title", "description", "location", "participants", "recurrence"],
    numeric: [],
    dates: ["date", "endDate"],
    {
        title: String,
        description: String,
        /// When the event starts; the reminder fires on this local day
        #[serde(deserialize_with = "crate::core::field::lenient::date")]
        date: Option<DateValue>,
        #[serde(deserialize_with = "crate::core::field::lenient::date")]
        end_date: Option<DateValue>,
        location: String,
        /// Comma or semicolon separated email addresses
        participants: String,
        recurrence: String,
    }
);

impl ScheduledEvent {
    /// Participant addresses, skipping blanks and malformed entries.
    pub fn recipients(&self) -> Vec<String> {
        self.participants
            .split([',', ';'])
            .map(str::trim)
            .filter(|s| is_email(s))
            .map(str::to_string)
            .collect()
    }
}
