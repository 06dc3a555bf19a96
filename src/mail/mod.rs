//! Outbound email
//!
//! Reminder jobs and auth handlers send mail through the [`Mailer`] trait.
//! Delivery is a single attempt with no queue; callers decide whether a
//! failure matters.

pub mod templates;

use crate::config::MailConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Recipient email address is missing")]
    MissingRecipient,

    #[error("Failed to render email template '{template}': {message}")]
    Template { template: String, message: String },

    #[error("Mail transport failed: {0}")]
    Transport(String),

    #[error("Mail provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Delivery seam for outbound mail
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Mailer that logs messages instead of delivering them
///
/// Sent messages are kept in memory so tests can inspect them.
#[derive(Debug, Clone, Default)]
pub struct LogMailer {
    outbox: Arc<Mutex<Vec<Email>>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far
    pub fn sent(&self) -> Vec<Email> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        if email.to.trim().is_empty() {
            return Err(MailError::MissingRecipient);
        }
        tracing::info!(to = %email.to, subject = %email.subject, "mail (log only)");
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(email);
        }
        Ok(())
    }
}

#[cfg(feature = "http-mail")]
mod http {
    use super::{Email, MailError, Mailer};
    use crate::config::MailConfig;
    use async_trait::async_trait;
    use serde_json::json;

    /// Mailer posting JSON to an HTTP delivery provider
    #[derive(Debug, Clone)]
    pub struct HttpMailer {
        client: reqwest::Client,
        url: String,
        api_key: Option<String>,
        from_address: String,
        from_name: String,
    }

    impl HttpMailer {
        pub fn new(url: String, config: &MailConfig) -> Self {
            let client = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .unwrap_or_default();
            Self {
                client,
                url,
                api_key: config.api_key.clone(),
                from_address: config.from_address.clone(),
                from_name: config.from_name.clone(),
            }
        }
    }

    #[async_trait]
    impl Mailer for HttpMailer {
        async fn send(&self, email: Email) -> Result<(), MailError> {
            if email.to.trim().is_empty() {
                return Err(MailError::MissingRecipient);
            }

            let payload = json!({
                "from": { "email": self.from_address, "name": self.from_name },
                "to": [{ "email": email.to }],
                "subject": email.subject,
                "text": email.text,
                "html": email.html,
            });

            let mut request = self.client.post(&self.url).json(&payload);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = request
                .send()
                .await
                .map_err(|e| MailError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(MailError::Rejected {
                    status: status.as_u16(),
                    body,
                });
            }

            tracing::debug!(to = %email.to, "mail accepted by provider");
            Ok(())
        }
    }
}

#[cfg(feature = "http-mail")]
pub use http::HttpMailer;

/// Pick a mailer for the configuration.
///
/// A provider URL needs the `http-mail` feature; without it mail is logged.
pub fn from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    match &config.provider_url {
        #[cfg(feature = "http-mail")]
        Some(url) => Arc::new(HttpMailer::new(url.clone(), config)),
        #[cfg(not(feature = "http-mail"))]
        Some(url) => {
            tracing::warn!(
                provider_url = %url,
                "mail provider configured but built without the http-mail feature, logging mail instead"
            );
            Arc::new(LogMailer::new())
        }
        None => Arc::new(LogMailer::new()),
    }
}
