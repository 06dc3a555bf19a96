//! People the business deals with

use crate::impl_record;

impl_record!(
    Contact,
    "contact",
    "contacts",
    label: "Contacts",
    path: "/contacts",
    text: [
        "firstName",
        "lastName",
        "emailAddress",
        "phoneNumber",
        "companyName",
        "jobTitle",
        "address",
        "notes",
    ],
    numeric: [],
    dates: [],
    {
        first_name: String,
        last_name: String,
        email_address: String,
        phone_number: String,
        company_name: String,
        job_title: String,
        address: String,
        notes: String,
    }
);

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
