//! Sales opportunity records: leads and deals share one shape

use crate::core::field::DateValue;
use crate::impl_record;

macro_rules! opportunity_record {
    ($doc:literal, $type:ident, $singular:expr, $plural:expr, $label:expr, $path:expr) => {
        impl_record!(
            #[doc = $doc]
            $type,
            $singular,
            $plural,
            label: $label,
            path: $path,
            text: [
                "companyName",
                "customerName",
                "contactNumber",
                "emailAddress",
                "address",
                "productName",
                "gstNumber",
                "status",
                "notes",
            ],
            numeric: ["amount"],
            dates: ["date", "endDate"],
            {
                company_name: String,
                customer_name: String,
                contact_number: String,
                email_address: String,
                address: String,
                product_name: String,
                #[serde(deserialize_with = "crate::core::field::lenient::number")]
                amount: f64,
                gst_number: String,
                /// Free-form funnel stage
                status: String,
                #[serde(deserialize_with = "crate::core::field::lenient::date")]
                date: Option<DateValue>,
                #[serde(deserialize_with = "crate::core::field::lenient::date")]
                end_date: Option<DateValue>,
                notes: String,
                #[serde(deserialize_with = "crate::core::field::lenient::boolean")]
                is_active: bool,
            }
        );
    };
}

opportunity_record!(
    "A prospective sale that has not been qualified yet.",
    Lead,
    "lead",
    "leads",
    "Leads",
    "/leads"
);

opportunity_record!(
    "An opportunity being worked towards a close.",
    Deal,
    "deal",
    "deals",
    "Deals",
    "/deals"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::{Entity, Record};
    use serde_json::json;

    #[test]
    fn test_status_update_preserves_company() {
        let lead = Lead::from_payload(json!({
            "companyName": "Acme",
            "status": "New",
            "amount": "15000",
            "isActive": "true"
        }))
        .unwrap();

        let updated = lead.merge(json!({"status": "Qualified"})).unwrap();
        assert_eq!(updated.company_name, "Acme");
        assert_eq!(updated.status, "Qualified");
        assert_eq!(updated.amount, 15000.0);
        assert!(updated.is_active);
    }

    #[test]
    fn test_deal_is_a_separate_collection() {
        assert_eq!(Lead::resource_name(), "leads");
        assert_eq!(Deal::resource_name(), "deals");
        assert_eq!(Deal::ui_path(), "/deals");
    }
}
