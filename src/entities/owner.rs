//! Business profile printed on invoices

use crate::impl_record;

impl_record!(
    Owner,
    "owner",
    "owners",
    label: "Owners",
    path: "/owners",
    text: ["ownerName", "emailAddress", "contactNumber", "businessName", "gstNumber", "address"],
    numeric: [],
    dates: [],
    {
        owner_name: String,
        email_address: String,
        contact_number: String,
        business_name: String,
        gst_number: String,
        address: String,
        /// Relative path of an uploaded logo
        logo: String,
    }
);
