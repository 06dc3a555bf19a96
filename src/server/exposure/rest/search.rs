//! Federated keyword search across the CRM collections

use super::handlers::ApiResponse;
use crate::core::error::CrmError;
use crate::core::{Record, SearchQuery};
use crate::storage::Stores;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hits kept per collection
pub const HITS_PER_COLLECTION: usize = 5;

#[derive(Clone)]
pub struct SearchState {
    pub stores: Stores,
    pub timezone: Tz,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// Dashboard route offered for a collection with at least one hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub name: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub leads: Vec<Value>,
    pub deals: Vec<Value>,
    pub invoices: Vec<Value>,
    pub contacts: Vec<Value>,
    pub accounts: Vec<Value>,
    pub tasks: Vec<Value>,
    pub scheduled_events: Vec<Value>,
    pub complaints: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: SearchResults,
    pub suggestions: Vec<Suggestion>,
}

/// Run one query against every searchable collection.
///
/// Any store error fails the whole search.
pub async fn federated_search(
    stores: &Stores,
    query: &SearchQuery,
) -> Result<SearchResponse, CrmError> {
    let (leads, deals, invoices, contacts, accounts, tasks, scheduled_events, complaints) = tokio::try_join!(
        stores.leads.search(query, HITS_PER_COLLECTION),
        stores.deals.search(query, HITS_PER_COLLECTION),
        stores.invoices.search(query, HITS_PER_COLLECTION),
        stores.contacts.search(query, HITS_PER_COLLECTION),
        stores.accounts.search(query, HITS_PER_COLLECTION),
        stores.tasks.search(query, HITS_PER_COLLECTION),
        stores.scheduled_events.search(query, HITS_PER_COLLECTION),
        stores.complaints.search(query, HITS_PER_COLLECTION),
    )?;

    let mut suggestions = Vec::new();
    let results = SearchResults {
        leads: collect(leads, &mut suggestions)?,
        deals: collect(deals, &mut suggestions)?,
        invoices: collect(invoices, &mut suggestions)?,
        contacts: collect(contacts, &mut suggestions)?,
        accounts: collect(accounts, &mut suggestions)?,
        tasks: collect(tasks, &mut suggestions)?,
        scheduled_events: collect(scheduled_events, &mut suggestions)?,
        complaints: collect(complaints, &mut suggestions)?,
    };

    Ok(SearchResponse {
        results,
        suggestions,
    })
}

fn collect<T: Record>(
    records: Vec<T>,
    suggestions: &mut Vec<Suggestion>,
) -> Result<Vec<Value>, CrmError> {
    let docs = records
        .iter()
        .take(HITS_PER_COLLECTION)
        .map(T::to_document)
        .collect::<Result<Vec<_>, _>>()?;

    if !docs.is_empty() {
        suggestions.push(Suggestion {
            name: T::label(),
            path: T::ui_path(),
        });
    }
    Ok(docs)
}

pub async fn search(
    State(state): State<SearchState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<SearchResponse>>, CrmError> {
    let query = SearchQuery::parse(params.q.as_deref().unwrap_or_default(), state.timezone)?;
    let response = federated_search(&state.stores, &query).await?;

    tracing::debug!(
        q = query.raw(),
        collections = response.suggestions.len(),
        "search finished"
    );
    Ok(Json(ApiResponse::ok("search results", response)))
}

pub fn routes(state: SearchState) -> Router {
    Router::new()
        .route("/api/v1/search", get(search))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Invoice, Lead};
    use serde_json::json;

    async fn seeded() -> Stores {
        let stores = Stores::in_memory();
        for name in ["Acme Corp", "Acme Labs", "Globex"] {
            let lead = Lead::from_payload(json!({"companyName": name, "amount": 900})).unwrap();
            stores.leads.create(lead).await.unwrap();
        }
        let invoice = Invoice::from_payload(json!({"companyName": "Initech", "amount": 1000, "discount": 10})).unwrap();
        stores.invoices.create(invoice).await.unwrap();
        stores
    }

    #[tokio::test]
    async fn test_text_search_suggests_matching_collections() {
        let stores = seeded().await;
        let query = SearchQuery::parse("acme", chrono_tz::UTC).unwrap();
        let response = federated_search(&stores, &query).await.unwrap();

        assert_eq!(response.results.leads.len(), 2);
        assert!(response.results.invoices.is_empty());
        assert_eq!(
            response.suggestions,
            vec![Suggestion { name: "Leads", path: "/leads" }]
        );
    }

    #[tokio::test]
    async fn test_numeric_search_hits_derived_totals() {
        let stores = seeded().await;
        // 900 is both the lead amount and the invoice's discounted total
        let query = SearchQuery::parse("900", chrono_tz::UTC).unwrap();
        let response = federated_search(&stores, &query).await.unwrap();

        assert_eq!(response.results.leads.len(), 3);
        assert_eq!(response.results.invoices.len(), 1);
        assert_eq!(response.suggestions.len(), 2);
    }

    #[tokio::test]
    async fn test_hits_capped_per_collection() {
        let stores = Stores::in_memory();
        for i in 0..8 {
            let lead = Lead::from_payload(json!({"companyName": format!("Zeta {}", i)})).unwrap();
            stores.leads.create(lead).await.unwrap();
        }
        let query = SearchQuery::parse("zeta", chrono_tz::UTC).unwrap();
        let response = federated_search(&stores, &query).await.unwrap();
        assert_eq!(response.results.leads.len(), HITS_PER_COLLECTION);
    }

    #[tokio::test]
    async fn test_no_hits_is_empty() {
        let stores = seeded().await;
        let query = SearchQuery::parse("nothing-like-this", chrono_tz::UTC).unwrap();
        let response = federated_search(&stores, &query).await.unwrap();
        assert!(response.suggestions.is_empty());
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["results"]["scheduledEvents"], json!([]));
    }
}
