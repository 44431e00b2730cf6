//! Outbound notification e-mail
//!
//! Delivery is best-effort: a failed send is logged by the caller and
//! never undoes the notification row that triggered it.

use async_trait::async_trait;
use classhub_common::{Error, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// One e-mail to one address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Transport for notification e-mail
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

/// Writes mail to the log instead of sending it
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        info!(to = %mail.to, subject = %mail.subject, "Mail (log only): {}", mail.body);
        Ok(())
    }
}

/// POSTs each mail as JSON to an HTTP endpoint that does the sending
#[derive(Debug, Clone)]
pub struct WebhookMailer {
    client: reqwest::Client,
    url: String,
}

impl WebhookMailer {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(mail)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("Mail webhook request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Delivery(format!(
                "Mail webhook returned HTTP {}",
                status
            )));
        }

        debug!(to = %mail.to, "Mail handed to webhook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let mail = OutgoingMail {
            to: "student@example.edu".to_string(),
            subject: "ClassHub: attendance".to_string(),
            body: "marked present".to_string(),
        };
        assert!(LogMailer.send(&mail).await.is_ok());
        assert_eq!(LogMailer.name(), "log");
    }

    #[tokio::test]
    async fn test_webhook_mailer_reports_unreachable_endpoint() {
        // Port 9 (discard) on localhost is not expected to run an HTTP server
        let mailer = WebhookMailer::new("http://127.0.0.1:9/mail").unwrap();
        let mail = OutgoingMail {
            to: "a@b.c".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
        };
        assert!(matches!(mailer.send(&mail).await, Err(Error::Delivery(_))));
        assert_eq!(mailer.url(), "http://127.0.0.1:9/mail");
    }
}
