//! REST API exposure
//!
//! Consumes a `ServerHost` and produces an Axum `Router` with:
//! - health checks
//! - CRUD routes for every collection under `/api/v1/{plural}`
//! - invoice listings and legacy `/api/v1/invoice/...` aliases
//! - notification feed actions, search, auth and the dashboard summary

pub mod auth;
pub mod dashboard;
pub mod handlers;
pub mod invoice;
pub mod notifications;
pub mod search;

use super::super::host::ServerHost;
use anyhow::Result;
use axum::{Json, Router, routing::get};
use handlers::RecordState;
use serde_json::{Value, json};
use std::sync::Arc;

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router from a host
    ///
    /// `custom_routes` are merged last.
    pub fn build_router(host: Arc<ServerHost>, custom_routes: Vec<Router>) -> Result<Router> {
        let invoice_state = RecordState {
            store: host.stores.invoices.clone(),
            event_bus: host.event_bus.clone(),
        };
        let notification_state = RecordState {
            store: host.stores.notifications.clone(),
            event_bus: host.event_bus.clone(),
        };
        let search_state = search::SearchState {
            stores: host.stores.clone(),
            timezone: host.timezone,
        };
        let auth_state = auth::AuthState {
            users: host.stores.users.clone(),
            mailer: host.mailer.clone(),
            config: host.config.auth.clone(),
        };

        let mut app = Self::health_routes()
            .merge(host.entity_registry.build_routes())
            .merge(invoice::routes(invoice_state))
            .merge(notifications::routes(notification_state))
            .merge(search::routes(search_state))
            .merge(auth::routes(auth_state))
            .merge(dashboard::routes(host.stores.clone()));

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app)
    }

    /// Build health check routes
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "ledgerline-crm"
        }))
    }
}
