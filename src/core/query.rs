//! Query parameters and pagination utilities

use crate::core::field::FieldValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Query parameters for pagination and filtering
///
/// # Example
/// ```text
/// GET /api/v1/leads?page=2&limit=10
/// GET /api/v1/invoices?filter={"status": "Unpaid"}
/// GET /api/v1/invoices?page=1&limit=20&sort=totalWithGst:desc
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct QueryParams {
    /// Page number (starts at 1)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Number of items per page
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Exact-match filters as a JSON object, e.g. `{"status": "Unpaid"}`
    pub filter: Option<String>,

    /// `field`, `field:asc` or `field:desc`. Defaults to newest first.
    pub sort: Option<String>,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

impl QueryParams {
    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Get limit, ensuring it doesn't exceed the maximum
    pub fn limit(&self) -> usize {
        self.limit.clamp(1, 100) // Maximum 100 per page, minimum 1
    }

    /// Records skipped before the current page. Saturates for huge pages.
    pub fn offset(&self) -> usize {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Parse filter JSON string into Value
    pub fn filter_value(&self) -> Option<Value> {
        self.filter
            .as_ref()
            .and_then(|s| serde_json::from_str(s).ok())
    }

    /// Filter, sort and slice a set of record documents.
    pub fn apply(&self, mut docs: Vec<Value>) -> PaginatedResponse<Value> {
        if let Some(Value::Object(filter)) = self.filter_value() {
            docs.retain(|doc| {
                filter
                    .iter()
                    .all(|(field, expected)| field_matches(doc.get(field), expected))
            });
        }

        let (field, descending) = self.sort_spec();
        docs.sort_by(|a, b| {
            let ordering = compare_field(a, b, &field);
            if descending { ordering.reverse() } else { ordering }
        });

        let page = self.page();
        let limit = self.limit();
        let total = docs.len();

        let data = docs.into_iter().skip(self.offset()).take(limit).collect();

        PaginatedResponse {
            success: true,
            message: String::new(),
            data,
            pagination: PaginationMeta::new(page, limit, total),
        }
    }

    fn sort_spec(&self) -> (String, bool) {
        match self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => ("createdAt".to_string(), true),
            Some(spec) => match spec.split_once(':') {
                Some((field, dir)) => (field.to_string(), dir.eq_ignore_ascii_case("desc")),
                None => (spec.to_string(), false),
            },
        }
    }
}

fn field_matches(actual: Option<&Value>, expected: &Value) -> bool {
    let Some(actual) = actual else {
        return expected.is_null();
    };
    match (actual, expected) {
        (Value::String(a), Value::String(e)) => a == e,
        (Value::Number(a), Value::Number(e)) => a.as_f64() == e.as_f64(),
        (Value::Number(a), Value::String(e)) => {
            e.trim().parse::<f64>().ok() == a.as_f64()
        }
        (Value::Bool(a), Value::Bool(e)) => a == e,
        (Value::Bool(a), Value::String(e)) => e.parse::<bool>().ok() == Some(*a),
        (a, e) => a == e,
    }
}

fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    let a = a.get(field).map(FieldValue::from_json).unwrap_or(FieldValue::Null);
    let b = b.get(field).map(FieldValue::from_json).unwrap_or(FieldValue::Null);
    a.compare(&b)
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub success: bool,

    pub message: String,

    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Pagination metadata
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        // Ensure limit is at least 1 to avoid division by zero
        let limit = limit.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = page.saturating_sub(1).saturating_mul(limit);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}
