//! Shared test harness for storage backend testing
//!
//! Provides record factories for the collections the contract suite uses.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod data_service_tests;

use chrono::{DateTime, Duration, TimeZone, Utc};
use crm::core::Record;
use crm::entities::{Invoice, Lead};
use serde_json::json;

/// An unpaid invoice for 1000 at 10% discount and 18% GST, 500 paid.
pub fn sample_invoice(company: &str) -> Invoice {
    Invoice::from_payload(json!({
        "companyName": company,
        "customerName": "Priya Nair",
        "emailAddress": "priya@example.com",
        "productName": "Annual support",
        "amount": 1000,
        "discount": 10,
        "gstRate": 18,
        "paidAmount": 500,
        "status": "Unpaid",
        "endDate": "2025-05-04"
    }))
    .unwrap()
}

/// A lead with a distinct company name, amount and creation time.
pub fn sample_lead(company: &str, amount: f64, created_at: DateTime<Utc>) -> Lead {
    let mut lead = Lead::from_payload(json!({
        "companyName": company,
        "customerName": "Arjun Rao",
        "emailAddress": format!("{}@example.com", company.to_lowercase()),
        "amount": amount,
        "status": "New"
    }))
    .unwrap();
    lead.created_at = created_at;
    lead.updated_at = created_at;
    lead
}

/// Creation times one minute apart, oldest first.
pub fn creation_times(count: i64) -> Vec<DateTime<Utc>> {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
    (0..count).map(|i| base + Duration::minutes(i)).collect()
}
