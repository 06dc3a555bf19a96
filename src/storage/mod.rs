//! Storage implementations and the per-collection store registry

pub mod in_memory;
#[cfg(feature = "mongodb_backend")]
pub mod mongodb;

pub use in_memory::InMemoryDataService;
#[cfg(feature = "mongodb_backend")]
pub use self::mongodb::MongoDataService;

use crate::config::{StorageBackend, StorageConfig};
use crate::core::DataService;
use crate::core::error::StorageError;
use crate::entities::{
    Account, Complaint, Contact, Deal, Invoice, Lead, Notification, Owner, ScheduledEvent, Task,
    User,
};
use anyhow::Result;
use std::sync::Arc;

/// One store per collection, shared by handlers and reminder jobs
#[derive(Clone)]
pub struct Stores {
    pub leads: Arc<dyn DataService<Lead>>,
    pub deals: Arc<dyn DataService<Deal>>,
    pub invoices: Arc<dyn DataService<Invoice>>,
    pub contacts: Arc<dyn DataService<Contact>>,
    pub accounts: Arc<dyn DataService<Account>>,
    pub tasks: Arc<dyn DataService<Task>>,
    pub scheduled_events: Arc<dyn DataService<ScheduledEvent>>,
    pub complaints: Arc<dyn DataService<Complaint>>,
    pub notifications: Arc<dyn DataService<Notification>>,
    pub owners: Arc<dyn DataService<Owner>>,
    pub users: Arc<dyn DataService<User>>,
}

impl Stores {
    /// Empty in-memory collections
    pub fn in_memory() -> Self {
        Self {
            leads: Arc::new(InMemoryDataService::<Lead>::new()),
            deals: Arc::new(InMemoryDataService::<Deal>::new()),
            invoices: Arc::new(InMemoryDataService::<Invoice>::new()),
            contacts: Arc::new(InMemoryDataService::<Contact>::new()),
            accounts: Arc::new(InMemoryDataService::<Account>::new()),
            tasks: Arc::new(InMemoryDataService::<Task>::new()),
            scheduled_events: Arc::new(InMemoryDataService::<ScheduledEvent>::new()),
            complaints: Arc::new(InMemoryDataService::<Complaint>::new()),
            notifications: Arc::new(InMemoryDataService::<Notification>::new()),
            owners: Arc::new(InMemoryDataService::<Owner>::new()),
            users: Arc::new(InMemoryDataService::<User>::new()),
        }
    }

    /// Collections of one MongoDB database
    #[cfg(feature = "mongodb_backend")]
    pub fn mongodb(database: ::mongodb::Database) -> Self {
        Self {
            leads: Arc::new(MongoDataService::<Lead>::new(database.clone())),
            deals: Arc::new(MongoDataService::<Deal>::new(database.clone())),
            invoices: Arc::new(MongoDataService::<Invoice>::new(database.clone())),
            contacts: Arc::new(MongoDataService::<Contact>::new(database.clone())),
            accounts: Arc::new(MongoDataService::<Account>::new(database.clone())),
            tasks: Arc::new(MongoDataService::<Task>::new(database.clone())),
            scheduled_events: Arc::new(MongoDataService::<ScheduledEvent>::new(database.clone())),
            complaints: Arc::new(MongoDataService::<Complaint>::new(database.clone())),
            notifications: Arc::new(MongoDataService::<Notification>::new(database.clone())),
            owners: Arc::new(MongoDataService::<Owner>::new(database.clone())),
            users: Arc::new(MongoDataService::<User>::new(database)),
        }
    }

    /// Build the stores selected by the configuration
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        match config.backend {
            StorageBackend::InMemory => {
                tracing::info!("using in-memory storage");
                Ok(Self::in_memory())
            }
            #[cfg(feature = "mongodb_backend")]
            StorageBackend::Mongodb => {
                let uri = config.uri.as_deref().unwrap_or("mongodb://localhost:27017");
                let client = ::mongodb::Client::with_uri_str(uri).await.map_err(|e| {
                    StorageError::ConnectionError {
                        backend: "mongodb".to_string(),
                        message: e.to_string(),
                    }
                })?;
                tracing::info!(database = %config.database, "using mongodb storage");
                Ok(Self::mongodb(client.database(&config.database)))
            }
            #[cfg(not(feature = "mongodb_backend"))]
            StorageBackend::Mongodb => Err(StorageError::Unavailable {
                backend: "mongodb".to_string(),
            }
            .into()),
        }
    }
}

impl Default for Stores {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_is_in_memory() {
        let stores = Stores::from_config(&StorageConfig::default()).await.unwrap();
        assert_eq!(stores.leads.count().await.unwrap(), 0);
    }

    #[cfg(not(feature = "mongodb_backend"))]
    #[tokio::test]
    async fn test_mongodb_unavailable_without_feature() {
        let config = StorageConfig {
            backend: StorageBackend::Mongodb,
            uri: Some("mongodb://localhost:27017".to_string()),
            ..Default::default()
        };
        let err = Stores::from_config(&config).await.err().unwrap();
        assert!(err.to_string().contains("unavailable"));
    }
}
