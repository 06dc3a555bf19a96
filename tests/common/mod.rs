//! Helpers shared by the HTTP-level integration tests

#![allow(dead_code)]

use axum_test::TestServer;
use crm::config::AppConfig;
use crm::mail::LogMailer;
use crm::server::{ServerBuilder, ServerHost};
use serde_json::Value;
use std::sync::Arc;

/// A running test app over empty in-memory stores
pub struct TestApp {
    pub server: TestServer,
    pub host: Arc<ServerHost>,
    pub mailer: LogMailer,
}

/// Defaults with the scheduler off and the cheapest bcrypt cost.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.scheduler.enabled = false;
    config.auth.bcrypt_cost = 4;
    config
}

pub fn test_app() -> TestApp {
    let mailer = LogMailer::new();
    let (host, app) = ServerBuilder::new()
        .with_config(test_config())
        .with_mailer(Arc::new(mailer.clone()))
        .build()
        .unwrap();

    TestApp {
        server: TestServer::new(app),
        host,
        mailer,
    }
}

/// `data.id` of a success envelope
pub fn data_id(body: &Value) -> String {
    body["data"]["id"]
        .as_str()
        .expect("response carries data.id")
        .to_string()
}
