//! # Ledgerline CRM
//!
//! A small-business CRM service over a document store: leads and deals,
//! GST invoices, contacts and accounts, tasks, calendar events and
//! complaints, with scheduled reminders pushed to dashboards over WebSocket.
//!
//! ## Layout
//!
//! - [`entities`]: record types and their derived fields (invoice totals)
//! - [`storage`]: the [`DataService`](core::DataService) stores, in-memory or MongoDB
//! - [`scheduler`]: the calendar and invoice reminder jobs
//! - [`server`]: REST and WebSocket exposure built by [`ServerBuilder`](server::ServerBuilder)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use crm::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load()?;
//!     let stores = Stores::from_config(&config.storage).await?;
//!
//!     ServerBuilder::new()
//!         .with_config(config)
//!         .with_stores(stores)
//!         .serve()
//!         .await
//! }
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod mail;
pub mod scheduler;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        CrmError, CrmEvent, DataService, DateValue, Entity, EntityEvent, EventBus, EventEnvelope,
        QueryParams, Record, SearchQuery,
    };

    // === Records ===
    pub use crate::entities::{
        Account, Complaint, Contact, Deal, Invoice, InvoiceStatus, Lead, Notification, Owner,
        ScheduledEvent, Task, User,
    };

    // === Storage ===
    pub use crate::storage::{InMemoryDataService, Stores};
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoDataService;

    // === Config, mail and jobs ===
    pub use crate::config::AppConfig;
    pub use crate::mail::{LogMailer, Mailer};
    pub use crate::scheduler::{ReminderScheduler, RunReport};

    // === Server ===
    pub use crate::server::{ServerBuilder, ServerHost};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
