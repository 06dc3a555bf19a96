//! Invoice routes beyond plain CRUD: paid/unpaid listings and legacy aliases

use super::handlers::{RecordState, create_record, delete_record, list_records, update_record};
use crate::core::Record;
use crate::core::error::CrmError;
use crate::core::query::{PaginatedResponse, QueryParams};
use crate::entities::{Invoice, InvoiceStatus};
use axum::extract::{Query, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::Value;

async fn list_with_status(
    state: &RecordState<Invoice>,
    params: &QueryParams,
    status: InvoiceStatus,
) -> Result<PaginatedResponse<Value>, CrmError> {
    let docs = state
        .store
        .list()
        .await?
        .into_iter()
        .filter(|invoice| invoice.status == status)
        .map(|invoice| invoice.to_document())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(params
        .apply(docs)
        .with_message(format!("{} invoices fetched successfully", status)))
}

pub async fn list_unpaid(
    State(state): State<RecordState<Invoice>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<PaginatedResponse<Value>>, CrmError> {
    list_with_status(&state, &params, InvoiceStatus::Unpaid).await.map(Json)
}

pub async fn list_paid(
    State(state): State<RecordState<Invoice>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<PaginatedResponse<Value>>, CrmError> {
    list_with_status(&state, &params, InvoiceStatus::Paid).await.map(Json)
}

/// `/api/v1/invoices/{unpaid,paid}` plus the `/api/v1/invoice/...` aliases
/// older dashboards call.
pub fn routes(state: RecordState<Invoice>) -> Router {
    Router::new()
        .route("/api/v1/invoices/unpaid", get(list_unpaid))
        .route("/api/v1/invoices/paid", get(list_paid))
        .route("/api/v1/invoice/invoiceAdd", post(create_record::<Invoice>))
        .route("/api/v1/invoice/getAllInvoices", get(list_records::<Invoice>))
        .route("/api/v1/invoice/updateInvoice/{id}", put(update_record::<Invoice>))
        .route("/api/v1/invoice/deleteInvoice/{id}", delete(delete_record::<Invoice>))
        .route("/api/v1/invoice/getUnpaidInvoices", get(list_unpaid))
        .route("/api/v1/invoice/getPaidInvoices", get(list_paid))
        .with_state(state)
}
