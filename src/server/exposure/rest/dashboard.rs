//! Dashboard summary: record counts and invoice money by status

use super::handlers::ApiResponse;
use crate::core::error::CrmError;
use crate::entities::{Invoice, InvoiceStatus};
use crate::storage::Stores;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCounts {
    pub leads: usize,
    pub deals: usize,
    pub invoices: usize,
    pub contacts: usize,
    pub accounts: usize,
    pub tasks: usize,
    pub scheduled_events: usize,
    pub complaints: usize,
    pub unread_notifications: usize,
}

/// Money figures of a group of invoices
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceMoney {
    pub count: usize,
    /// Sum of totalWithGst
    pub billed: f64,
    /// Sum of paidAmount
    pub collected: f64,
    /// Sum of remainingAmount
    pub outstanding: f64,
}

impl InvoiceMoney {
    fn add(&mut self, invoice: &Invoice) {
        self.count += 1;
        self.billed += invoice.total_with_gst;
        self.collected += invoice.paid_amount;
        self.outstanding += invoice.remaining_amount;
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub counts: CollectionCounts,
    pub invoices: InvoiceSummary,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub total: InvoiceMoney,
    /// Keyed by status name: Paid, Pending, Unpaid
    pub by_status: BTreeMap<&'static str, InvoiceMoney>,
}

pub fn summarize_invoices(invoices: &[Invoice]) -> InvoiceSummary {
    let mut summary = InvoiceSummary::default();
    for status in [InvoiceStatus::Unpaid, InvoiceStatus::Paid, InvoiceStatus::Pending] {
        summary.by_status.insert(status.as_str(), InvoiceMoney::default());
    }
    for invoice in invoices {
        summary.total.add(invoice);
        summary
            .by_status
            .entry(invoice.status.as_str())
            .or_default()
            .add(invoice);
    }
    summary
}

pub async fn summary(
    State(stores): State<Stores>,
) -> Result<Json<ApiResponse<DashboardSummary>>, CrmError> {
    let invoices = stores.invoices.list().await?;
    let (leads, deals, contacts, accounts, tasks, scheduled_events, complaints, notifications) = tokio::try_join!(
        stores.leads.count(),
        stores.deals.count(),
        stores.contacts.count(),
        stores.accounts.count(),
        stores.tasks.count(),
        stores.scheduled_events.count(),
        stores.complaints.count(),
        stores.notifications.list(),
    )?;

    let counts = CollectionCounts {
        leads,
        deals,
        invoices: invoices.len(),
        contacts,
        accounts,
        tasks,
        scheduled_events,
        complaints,
        unread_notifications: notifications.iter().filter(|n| !n.is_read).count(),
    };

    Ok(Json(ApiResponse::ok(
        "dashboard summary",
        DashboardSummary {
            counts,
            invoices: summarize_invoices(&invoices),
        },
    )))
}

pub fn routes(stores: Stores) -> Router {
    Router::new()
        .route("/api/v1/dashboard/summary", get(summary))
        .with_state(stores)
}
