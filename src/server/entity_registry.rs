//! Registry of the collections exposed through the generic record routes

use crate::core::events::EventBus;
use crate::core::{DataService, Record};
use crate::server::exposure::rest::handlers::RecordDescriptor;
use crate::storage::Stores;
use axum::Router;
use std::collections::BTreeMap;
use std::sync::Arc;

/// How one collection is mounted on the REST router
///
/// Each record type (Lead, Invoice, Task, etc.) is exposed through a
/// descriptor providing its CRUD routes.
pub trait EntityDescriptor: Send + Sync {
    /// Singular type name, e.g. "lead"
    fn entity_type(&self) -> &str;

    /// Collection name used in the URL, e.g. "leads"
    fn plural(&self) -> &str;

    /// List, create, get, update, delete and status routes under
    /// `/api/v1/{plural}`
    fn build_routes(&self) -> Router;
}

/// Collections keyed by singular type name
#[derive(Default)]
pub struct EntityRegistry {
    descriptors: BTreeMap<String, Box<dyn EntityDescriptor>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard CRUD routes of every collection.
    ///
    /// Users are left out: accounts are managed through the auth routes.
    pub fn for_stores(stores: &Stores, event_bus: &EventBus) -> Self {
        let mut registry = Self::new();
        registry.expose(stores.leads.clone(), event_bus);
        registry.expose(stores.deals.clone(), event_bus);
        registry.expose(stores.invoices.clone(), event_bus);
        registry.expose(stores.contacts.clone(), event_bus);
        registry.expose(stores.accounts.clone(), event_bus);
        registry.expose(stores.tasks.clone(), event_bus);
        registry.expose(stores.scheduled_events.clone(), event_bus);
        registry.expose(stores.complaints.clone(), event_bus);
        registry.expose(stores.notifications.clone(), event_bus);
        registry.expose(stores.owners.clone(), event_bus);
        registry
    }

    fn expose<T: Record>(&mut self, store: Arc<dyn DataService<T>>, event_bus: &EventBus) {
        self.register(Box::new(RecordDescriptor::new(store, event_bus.clone())));
    }

    /// Add a descriptor; a later one with the same type name replaces the earlier.
    pub fn register(&mut self, descriptor: Box<dyn EntityDescriptor>) {
        let entity_type = descriptor.entity_type().to_string();
        if self.descriptors.insert(entity_type, descriptor).is_some() {
            tracing::warn!("collection registered twice, keeping the last descriptor");
        }
    }

    /// Merge the routes of every registered collection
    pub fn build_routes(&self) -> Router {
        self.descriptors
            .values()
            .fold(Router::new(), |router, descriptor| {
                router.merge(descriptor.build_routes())
            })
    }

    /// Registered type names, sorted
    pub fn entity_types(&self) -> Vec<&str> {
        self.descriptors.keys().map(String::as_str).collect()
    }

    /// Base path of each collection, sorted by type name
    pub fn base_paths(&self) -> Vec<String> {
        self.descriptors
            .values()
            .map(|d| format!("/api/v1/{}", d.plural()))
            .collect()
    }
}
