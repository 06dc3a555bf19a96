//! MongoDB storage backend using the official MongoDB async driver.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag.
//!
//! # Storage model
//!
//! One collection per record type, named after `T::resource_name()`
//! ("leads", "invoices", ...).
//!
//! # Serialization strategy
//!
//! Records are serialized via `serde_json::Value` as an intermediate format,
//! then converted to BSON documents. UUIDs and timestamps are stored as
//! strings, so timestamp range filters compare RFC 3339 text.
//! The `id` field is mapped to MongoDB's `_id` convention.

use crate::core::{DataService, Record, SearchQuery};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::SecondsFormat;
use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::{Bson, Document, doc};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a JSON object into a BSON Document, renaming `id` → `_id`.
fn json_to_document(json: serde_json::Value) -> Result<Document> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON Document back into JSON, renaming `_id` → `id`.
fn document_to_json(mut doc: Document) -> serde_json::Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

/// Build the `$or` filter for a keyword query over `T`'s fields.
fn search_filter<T: Record>(query: &SearchQuery) -> Document {
    let mut clauses: Vec<Document> = T::text_fields()
        .iter()
        .map(|field| doc! { *field: { "$regex": query.escaped(), "$options": "i" } })
        .collect();

    if let Some(number) = query.number() {
        clauses.extend(T::numeric_fields().iter().map(|field| doc! { *field: number }));
    }

    // Timestamps are stored as RFC 3339 UTC strings with optional fractional
    // seconds. Millisecond bounds order correctly against every such string.
    // Bare days are stored as `YYYY-MM-DD` and must match exactly.
    if let (Some(date), Some(day)) = (query.date(), query.day()) {
        let bare = date.format("%Y-%m-%d").to_string();
        let start = day.start.to_rfc3339_opts(SecondsFormat::Millis, true);
        let end = day.end.to_rfc3339_opts(SecondsFormat::Millis, true);
        for field in T::date_fields() {
            clauses.push(doc! { *field: bare.as_str() });
            clauses.push(doc! {
                *field: { "$gte": start.as_str(), "$lt": end.as_str(), "$regex": "T" }
            });
        }
    }

    doc! { "$or": clauses }
}

// ---------------------------------------------------------------------------
// MongoDataService<T>
// ---------------------------------------------------------------------------

/// Record storage backed by one MongoDB collection.
///
/// # Example
///
/// ```rust,ignore
/// let client = mongodb::Client::with_uri_str("mongodb://localhost:27017").await?;
/// let leads = MongoDataService::<Lead>::new(client.database("crm"));
/// let lead = leads.create(lead).await?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoDataService<T> {
    database: Database,
    _marker: std::marker::PhantomData<T>,
}

impl<T> MongoDataService<T> {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            _marker: std::marker::PhantomData,
        }
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl<T: Record> MongoDataService<T> {
    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(T::resource_name())
    }

    fn record_to_document(record: &T) -> Result<Document> {
        let json = serde_json::to_value(record)
            .map_err(|e| anyhow!("Failed to serialize {}: {}", T::resource_name_singular(), e))?;
        json_to_document(json)
    }

    fn document_to_record(doc: Document) -> Result<T> {
        let json = document_to_json(doc);
        serde_json::from_value(json).map_err(|e| {
            anyhow!(
                "Failed to deserialize {} from document: {}",
                T::resource_name_singular(),
                e
            )
        })
    }

    async fn find(&self, filter: Document, limit: Option<i64>) -> Result<Vec<T>> {
        let mut find = self
            .collection()
            .find(filter)
            .sort(doc! { "createdAt": -1 });
        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let docs: Vec<Document> = find
            .await
            .map_err(|e| anyhow!("Failed to query {}: {}", T::resource_name(), e))?
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect {}: {}", T::resource_name(), e))?;

        docs.into_iter().map(Self::document_to_record).collect()
    }
}

#[async_trait]
impl<T: Record> DataService<T> for MongoDataService<T> {
    async fn create(&self, record: T) -> Result<T> {
        let doc = Self::record_to_document(&record)?;

        self.collection()
            .insert_one(doc)
            .await
            .map_err(|e| anyhow!("Failed to create {}: {}", T::resource_name_singular(), e))?;

        Ok(record)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<T>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to get {}: {}", T::resource_name_singular(), e))?;

        doc.map(Self::document_to_record).transpose()
    }

    /// Newest first
    async fn list(&self) -> Result<Vec<T>> {
        self.find(doc! {}, None).await
    }

    /// Returns `Err` if no document matched.
    async fn update(&self, id: &Uuid, record: T) -> Result<T> {
        let doc = Self::record_to_document(&record)?;

        let result = self
            .collection()
            .replace_one(doc! { "_id": uuid_bson(id) }, doc)
            .await
            .map_err(|e| anyhow!("Failed to update {}: {}", T::resource_name_singular(), e))?;

        if result.matched_count == 0 {
            return Err(anyhow!("{} not found: {}", T::resource_name_singular(), id));
        }

        Ok(record)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let result = self
            .collection()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to delete {}: {}", T::resource_name_singular(), e))?;

        Ok(result.deleted_count > 0)
    }

    /// Keyword search pushed down to the server as an `$or` filter.
    async fn search(&self, query: &SearchQuery, limit: usize) -> Result<Vec<T>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.find(search_filter::<T>(query), Some(limit)).await
    }

    async fn count(&self) -> Result<usize> {
        let count = self
            .collection()
            .count_documents(doc! {})
            .await
            .map_err(|e| anyhow!("Failed to count {}: {}", T::resource_name(), e))?;

        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }
}
