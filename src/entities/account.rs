//! Customer organisations

use crate::impl_record;

impl_record!(
    Account,
    "account",
    "accounts",
    label: "Accounts",
    path: "/accounts",
    text: [
        "accountName",
        "industry",
        "website",
        "phoneNumber",
        "emailAddress",
        "address",
        "accountOwner",
        "notes",
    ],
    numeric: ["annualRevenue"],
    dates: [],
    {
        account_name: String,
        industry: String,
        website: String,
        phone_number: String,
        email_address: String,
        address: String,
        /// Name of the staff member who owns the relationship
        account_owner: String,
        #[serde(deserialize_with = "crate::core::field::lenient::number")]
        annual_revenue: f64,
        notes: String,
    }
);
