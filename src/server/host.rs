//! Shared application state for every exposure
//!
//! `ServerHost` is the single source of truth handed to the REST and
//! WebSocket exposures and to the reminder scheduler. It carries no
//! transport-specific state.

use crate::config::AppConfig;
use crate::core::error::ConfigError;
use crate::core::events::EventBus;
use crate::mail::{self, Mailer};
use crate::server::entity_registry::EntityRegistry;
use crate::storage::Stores;
use chrono_tz::Tz;
use std::sync::Arc;

/// Host context containing all service state
///
/// # Example
///
/// ```rust,ignore
/// let host = Arc::new(ServerHost::new(config, Stores::in_memory(), mailer)?);
/// let rest_app = RestExposure::build_router(host.clone(), vec![])?;
/// let ws_app = WebSocketExposure::build_router(host)?;
/// ```
pub struct ServerHost {
    pub config: AppConfig,

    /// One store per collection
    pub stores: Stores,

    /// Live events for WebSocket clients
    pub event_bus: EventBus,

    pub mailer: Arc<dyn Mailer>,

    /// Timezone that decides what "today" means for reminders and search
    pub timezone: Tz,

    /// CRUD routes of every collection
    pub entity_registry: EntityRegistry,
}

impl ServerHost {
    pub fn new(
        config: AppConfig,
        stores: Stores,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, ConfigError> {
        let timezone = config.scheduler.tz()?;
        let event_bus = EventBus::new(config.events.capacity);
        let entity_registry = EntityRegistry::for_stores(&stores, &event_bus);

        Ok(Self {
            config,
            stores,
            event_bus,
            mailer,
            timezone,
            entity_registry,
        })
    }

    /// Host with default configuration, in-memory stores and a logging mailer
    pub fn in_memory() -> Result<Self, ConfigError> {
        let config = AppConfig::default();
        let mailer = mail::from_config(&config.mail);
        Self::new(config, Stores::in_memory(), mailer)
    }

    /// Get entity types registered in the host
    pub fn entity_types(&self) -> Vec<&str> {
        self.entity_registry.entity_types()
    }
}
