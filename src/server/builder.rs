//! ServerBuilder for fluent API to build the HTTP server

use super::exposure::{RestExposure, WebSocketExposure};
use super::host::ServerHost;
use crate::config::AppConfig;
use crate::mail::{self, Mailer};
use crate::scheduler::ReminderScheduler;
use crate::storage::Stores;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builder for the CRM server
///
/// # Example
///
/// ```ignore
/// let stores = Stores::from_config(&config.storage).await?;
/// ServerBuilder::new()
///     .with_config(config)
///     .with_stores(stores)
///     .serve()
///     .await?;
/// ```
pub struct ServerBuilder {
    config: AppConfig,
    stores: Option<Stores>,
    mailer: Option<Arc<dyn Mailer>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            stores: None,
            mailer: None,
            custom_routes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Stores to serve from. Defaults to empty in-memory collections.
    pub fn with_stores(mut self, stores: Stores) -> Self {
        self.stores = Some(stores);
        self
    }

    /// Mailer for reminders and account mail. Defaults to the configured provider.
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Add routes that don't fit the CRUD pattern
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the transport-agnostic host
    pub fn build_host(&mut self) -> Result<ServerHost> {
        let stores = self.stores.take().unwrap_or_else(Stores::in_memory);
        let mailer = self
            .mailer
            .take()
            .unwrap_or_else(|| mail::from_config(&self.config.mail));
        Ok(ServerHost::new(self.config.clone(), stores, mailer)?)
    }

    /// Build the full router (REST + WebSocket) over an existing host.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn router(host: Arc<ServerHost>, custom_routes: Vec<Router>) -> Result<Router> {
        let rest = RestExposure::build_router(host.clone(), custom_routes)?;
        let ws = WebSocketExposure::build_router(host)?;

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Ok(rest
            .merge(ws)
            .layer(TraceLayer::new_for_http())
            .layer(cors))
    }

    /// Build the host and the router in one go
    pub fn build(mut self) -> Result<(Arc<ServerHost>, Router)> {
        let host = Arc::new(self.build_host()?);
        let router = Self::router(host.clone(), std::mem::take(&mut self.custom_routes))?;
        Ok((host, router))
    }

    /// Serve the application with graceful shutdown
    ///
    /// Starts the reminder scheduler when enabled, serves until SIGTERM or
    /// Ctrl+C, then stops the scheduler.
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.server.bind_address();
        let scheduler_enabled = self.config.scheduler.enabled;
        let (host, app) = self.build()?;

        let scheduler = if scheduler_enabled {
            Some(ReminderScheduler::from_host(&host)?.start())
        } else {
            tracing::info!("reminder scheduler disabled");
            None
        };

        tracing::debug!(collections = ?host.entity_registry.base_paths(), "record routes mounted");

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(handle) = scheduler {
            handle.shutdown().await;
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
