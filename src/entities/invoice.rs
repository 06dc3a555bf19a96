//! Invoice record with GST and discount totals

use crate::core::field::DateValue;
use crate::impl_record;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Payment status of an invoice
///
/// Anything other than the three known values reads as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
    #[default]
    Pending,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "Unpaid",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Pending => "Pending",
        }
    }

    /// Parse a status, falling back to `Pending`.
    pub fn parse_lenient(input: &str) -> Self {
        match input.trim() {
            "Unpaid" => InvoiceStatus::Unpaid,
            "Paid" => InvoiceStatus::Paid,
            _ => InvoiceStatus::Pending,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InvoiceStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .map(InvoiceStatus::parse_lenient)
            .unwrap_or_default())
    }
}

/// Derived money fields of an invoice
///
/// Only built through [`InvoiceTotals::compute`]; inputs below zero or not
/// finite count as zero. No rounding is applied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InvoiceTotals {
    pub total_without_gst: f64,
    pub total_with_gst: f64,
    pub remaining_amount: f64,
}

impl InvoiceTotals {
    pub fn compute(amount: f64, discount: f64, gst_rate: f64, paid_amount: f64) -> Self {
        let amount = non_negative(amount);
        let discount = non_negative(discount);
        let gst_rate = non_negative(gst_rate);
        let paid_amount = non_negative(paid_amount);

        let discounted = amount - amount * discount / 100.0;
        let gst = discounted * gst_rate / 100.0;
        let total_with_gst = discounted + gst;

        Self {
            total_without_gst: discounted,
            total_with_gst,
            remaining_amount: total_with_gst - paid_amount,
        }
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

impl_record!(
    /// A billing record. The three total fields are recomputed from
    /// `amount`, `discount`, `gstRate` and `paidAmount` on every write.
    Invoice,
    "invoice",
    "invoices",
    label: "Invoices",
    path: "/invoices",
    text: [
        "companyName",
        "customerName",
        "contactNumber",
        "emailAddress",
        "address",
        "gstNumber",
        "productName",
        "status",
    ],
    numeric: [
        "amount",
        "discount",
        "gstRate",
        "paidAmount",
        "totalWithoutGst",
        "totalWithGst",
        "remainingAmount",
    ],
    dates: ["date", "endDate"],
    {
        company_name: String,
        customer_name: String,
        contact_number: String,
        email_address: String,
        address: String,
        gst_number: String,
        product_name: String,
        #[serde(deserialize_with = "crate::core::field::lenient::number")]
        amount: f64,
        /// Percentage taken off `amount`
        #[serde(deserialize_with = "crate::core::field::lenient::number")]
        discount: f64,
        /// Percentage added on the discounted amount
        #[serde(deserialize_with = "crate::core::field::lenient::number")]
        gst_rate: f64,
        status: InvoiceStatus,
        #[serde(deserialize_with = "crate::core::field::lenient::date")]
        date: Option<DateValue>,
        /// Due date
        #[serde(deserialize_with = "crate::core::field::lenient::date")]
        end_date: Option<DateValue>,
        #[serde(deserialize_with = "crate::core::field::lenient::number")]
        paid_amount: f64,
        #[serde(deserialize_with = "crate::core::field::lenient::number")]
        total_without_gst: f64,
        #[serde(deserialize_with = "crate::core::field::lenient::number")]
        total_with_gst: f64,
        #[serde(deserialize_with = "crate::core::field::lenient::number")]
        remaining_amount: f64,
    },
    refresh: Invoice::recompute_totals
);

impl Invoice {
    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals::compute(self.amount, self.discount, self.gst_rate, self.paid_amount)
    }

    fn recompute_totals(&mut self) {
        let totals = self.totals();
        self.total_without_gst = totals.total_without_gst;
        self.total_with_gst = totals.total_with_gst;
        self.remaining_amount = totals.remaining_amount;
    }
}
