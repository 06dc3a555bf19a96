//! `crm-server`: loads the config, opens the stores and serves until shutdown.
//!
//! The config file path comes from `CRM_CONFIG`; `RUST_LOG` controls log output.

use anyhow::Result;
use crm::config::AppConfig;
use crm::mail;
use crm::server::ServerBuilder;
use crm::storage::Stores;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        address = %config.server.bind_address(),
        backend = ?config.storage.backend,
        timezone = %config.scheduler.timezone,
        "starting ledgerline-crm v{}",
        env!("CARGO_PKG_VERSION")
    );

    let stores = Stores::from_config(&config.storage).await?;
    let mailer = mail::from_config(&config.mail);

    ServerBuilder::new()
        .with_config(config)
        .with_stores(stores)
        .with_mailer(mailer)
        .serve()
        .await
}
