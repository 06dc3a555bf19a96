//! Internal to-do items

use crate::core::field::DateValue;
use crate::impl_record;

impl_record!(
    Task,
    "task",
    "tasks",
    label: "Tasks",
    path: "/tasks",
    text: ["subject", "description", "assignedTo", "priority", "status"],
    numeric: [],
    dates: ["dueDate"],
    {
        subject: String,
        description: String,
        assigned_to: String,
        priority: String,
        status: String,
        #[serde(deserialize_with = "crate::core::field::lenient::date")]
        due_date: Option<DateValue>,
    }
);
