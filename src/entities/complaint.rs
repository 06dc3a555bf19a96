//! Customer complaints and their handling status

use crate::core::field::DateValue;
use crate::impl_record;

impl_record!(
    Complaint,
    "complaint",
    "complaints",
    label: "Complaints",
    path: "/complaints",
    text: [
        "customerName",
        "emailAddress",
        "contactNumber",
        "subject",
        "description",
        "priority",
        "status",
    ],
    numeric: [],
    dates: ["date"],
    {
        customer_name: String,
        email_address: String,
        contact_number: String,
        subject: String,
        description: String,
        priority: String,
        status: String,
        #[serde(deserialize_with = "crate::core::field::lenient::date")]
        date: Option<DateValue>,
    }
);
