//! Configuration loading and management
//!
//! Configuration is a YAML document with one section per concern. Every key
//! has a default, so an empty file (or no file at all) is a valid config.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8000
//! storage:
//!   backend: mongodb
//!   uri: mongodb://localhost:27017
//!   database: crm
//! scheduler:
//!   timezone: Asia/Kolkata
//!   invoice_run_at: "09:00"
//! ```

use crate::core::error::ConfigError;
use anyhow::{Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Environment variable holding the path of the YAML config file
pub const CONFIG_PATH_ENV: &str = "CRM_CONFIG";

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub scheduler: SchedulerConfig,
    pub mail: MailConfig,
    pub auth: AuthConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which store implementation backs the collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    InMemory,
    Mongodb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Connection string, only read by the mongodb backend
    pub uri: Option<String>,
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::InMemory,
            uri: None,
            database: "crm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Start the reminder jobs with the server
    pub enabled: bool,
    /// IANA timezone name used to decide what "today" is
    pub timezone: String,
    pub calendar_interval_secs: u64,
    /// Local wall-clock time of the daily invoice run, `HH:MM`
    pub invoice_run_at: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timezone: "Asia/Kolkata".to_string(),
            calendar_interval_secs: 60,
            invoice_run_at: "09:00".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "scheduler.timezone".to_string(),
                value: self.timezone.clone(),
                message: e.to_string(),
            })
    }

    pub fn invoice_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(self.invoice_run_at.trim(), "%H:%M").map_err(|e| {
            ConfigError::InvalidValue {
                field: "scheduler.invoice_run_at".to_string(),
                value: self.invoice_run_at.clone(),
                message: e.to_string(),
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub from_address: String,
    pub from_name: String,
    /// Recipient of calendar reminders for events without participants
    pub default_recipient: Option<String>,
    /// HTTP endpoint of the delivery provider. Without it mail is only logged.
    pub provider_url: Option<String>,
    pub api_key: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_address: "no-reply@localhost".to_string(),
            from_name: "CRM".to_string(),
            default_recipient: None,
            provider_url: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL of the dashboard, used to build links in emails
    pub app_base_url: String,
    pub reset_token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            app_base_url: "http://localhost:3000".to_string(),
            reset_token_ttl_minutes: 60,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast buffer size before slow WebSocket clients lag
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;
        serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                file: Some(path.to_string()),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            ConfigError::ParseError {
                file: None,
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load from `CRM_CONFIG` (or defaults), apply env overrides, validate.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_yaml_file(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CRM_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("CRM_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("CRM_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "server.port".to_string(),
                value: port.clone(),
                message: "expected a port number".to_string(),
            })?;
        }
        if let Some(tz) = lookup("CRM_TIMEZONE") {
            self.scheduler.timezone = tz;
        }
        if let Some(uri) = lookup("CRM_MONGODB_URI") {
            self.storage.backend = StorageBackend::Mongodb;
            self.storage.uri = Some(uri);
        }
        Ok(())
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.tz()?;
        self.scheduler.invoice_time()?;

        if self.scheduler.calendar_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scheduler.calendar_interval_secs".to_string(),
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.storage.backend == StorageBackend::Mongodb && self.storage.uri.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "storage.uri".to_string(),
                value: String::new(),
                message: "required for the mongodb backend".to_string(),
            });
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                field: "auth.bcrypt_cost".to_string(),
                value: self.auth.bcrypt_cost.to_string(),
                message: "must be between 4 and 31".to_string(),
            });
        }
        Ok(())
    }
}
