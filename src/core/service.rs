//! Service trait for record storage

use crate::core::entity::Record;
use crate::core::search::SearchQuery;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Service trait for managing one collection of records
///
/// Implementations provide CRUD operations for a specific record type.
/// Handlers and jobs are agnostic to the underlying storage mechanism.
#[async_trait]
pub trait DataService<T: Record>: Send + Sync {
    /// Insert a new record
    async fn create(&self, entity: T) -> Result<T>;

    /// Get a record by ID
    async fn get(&self, id: &Uuid) -> Result<Option<T>>;

    /// List all records
    async fn list(&self) -> Result<Vec<T>>;

    /// Replace an existing record
    async fn update(&self, id: &Uuid, entity: T) -> Result<T>;

    /// Delete a record. Returns false when no record had this id.
    async fn delete(&self, id: &Uuid) -> Result<bool>;

    /// Return at most `limit` records matching a keyword query
    async fn search(&self, query: &SearchQuery, limit: usize) -> Result<Vec<T>> {
        let mut hits = Vec::new();
        for record in self.list().await? {
            if hits.len() >= limit {
                break;
            }
            let doc = serde_json::to_value(&record)?;
            if query.matches::<T>(&doc) {
                hits.push(record);
            }
        }
        Ok(hits)
    }

    /// Number of stored records
    async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }
}
