//! Alert delivery. Best-effort and fire-and-forget: one attempt per
//! event, bounded timeout, failure is a log line and a counter, never an
//! error that reaches the dispatcher.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use reqwest::{Client, Url};
use serde_json::json;
use std::time::Duration;

use crate::pretty::webhook_text;
use crate::types::Event;

#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Deliver one event. Returns whether delivery succeeded.
    async fn send(&self, event: &Event) -> bool;

    /// Deliver a bare text message (used for the daemon's final critical
    /// alert on fatal shutdown).
    async fn send_text(&self, text: &str) -> bool;
}

/// Slack-compatible webhook sink: POSTs `{"text": ...}` per event.
pub struct WebhookSink {
    client: Client,
    url: Url,
}

impl WebhookSink {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url).context("invalid webhook URL")?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build webhook HTTP client")?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, event: &Event) -> bool {
        self.send_text(&webhook_text(event)).await
    }

    async fn send_text(&self, text: &str) -> bool {
        let payload = json!({ "text": text });
        match self.client.post(self.url.clone()).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("[webhook] alert delivered");
                true
            }
            Ok(resp) => {
                warn!("[webhook] delivery rejected: status {}", resp.status());
                false
            }
            Err(err) => {
                warn!("[webhook] delivery failed: {}", err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_url() {
        assert!(WebhookSink::new("not a url", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn accepts_http_url() {
        assert!(WebhookSink::new("http://localhost:9999/hook", Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn unreachable_webhook_reports_failure_without_error() {
        // Port 9 on localhost is about as dead as it gets.
        let sink = WebhookSink::new("http://127.0.0.1:9/hook", Duration::from_millis(300)).unwrap();
        assert!(!sink.send_text("hello").await);
    }
}
