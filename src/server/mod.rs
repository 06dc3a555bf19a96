//! HTTP server: shared host, route registry, REST and WebSocket exposures

pub mod builder;
pub mod entity_registry;
pub mod exposure;
pub mod host;

pub use builder::ServerBuilder;
pub use entity_registry::{EntityDescriptor, EntityRegistry};
pub use exposure::{RestExposure, WebSocketExposure};
pub use host::ServerHost;
