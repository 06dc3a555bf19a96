//! WebSocket exposure for live dashboard events
//!
//! ```text
//! Client ──ws──▶ /ws ──▶ ws_handler() ──▶ ConnectionManager
//!                                              │
//!                                     subscribe(filter)
//!                                              │
//!                           EventBus ──broadcast──▶ filter ──▶ Client
//! ```
//!
//! Every connection starts subscribed to `reminder`, `calenderreminder` and
//! `notification`. Record changes (`entity`) need an explicit subscription.
//! See [`protocol`] for the message shapes.

mod handler;
mod manager;
pub mod protocol;

pub use manager::ConnectionManager;

use crate::server::host::ServerHost;
use anyhow::Result;
use axum::{Router, routing::get};
use std::sync::Arc;

pub struct WebSocketExposure;

impl WebSocketExposure {
    /// Build the `/ws` router and spawn the dispatch loop on the host's bus.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn build_router(host: Arc<ServerHost>) -> Result<Router> {
        let connection_manager = Arc::new(ConnectionManager::new());

        let rx = host.event_bus.subscribe();
        tokio::spawn(connection_manager.clone().run_dispatch_loop(rx));

        let router = Router::new()
            .route("/ws", get(handler::ws_handler))
            .with_state(connection_manager);

        Ok(router)
    }
}
