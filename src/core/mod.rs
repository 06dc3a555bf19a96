//! Core module containing the fundamental traits and types of the service

pub mod entity;
pub mod error;
pub mod events;
pub mod field;
pub mod query;
pub mod search;
pub mod service;

pub use entity::{Entity, Record};
pub use error::CrmError;
pub use events::{CrmEvent, EntityEvent, EventBus, EventEnvelope, ReminderEvent};
pub use field::{DateValue, FieldValue};
pub use query::{PaginatedResponse, PaginationMeta, QueryParams};
pub use search::SearchQuery;
pub use service::DataService;
