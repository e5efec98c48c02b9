//! Discord webhook sink

use super::NotificationSink;
use crate::error::{GotobiError, Result};
use crate::types::Signal;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Discord rejects messages longer than this
const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts rendered signals to a Discord webhook
pub struct DiscordWebhook {
    client: Client,
    url: String,
    footer: Option<String>,
}

impl DiscordWebhook {
    /// Create a new webhook sink
    pub fn new(url: impl Into<String>, footer: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GotobiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            footer,
        })
    }

    /// Message body as posted
    pub fn content(&self, signal: &Signal) -> String {
        signal
            .render(self.footer.as_deref())
            .chars()
            .take(MAX_CONTENT_CHARS)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for DiscordWebhook {
    async fn deliver(&self, signal: &Signal) -> Result<()> {
        let content = self.content(signal);
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { content: &content })
            .send()
            .await
            .map_err(|e| GotobiError::Delivery {
                sink: self.name().to_string(),
                reason: format!("HTTP request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(GotobiError::Delivery {
                sink: self.name().to_string(),
                reason: format!("webhook returned {}", response.status()),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "discord"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Phase;
    use crate::types::{local_time, Severity};

    #[test]
    fn test_content_is_truncated() {
        let sink = DiscordWebhook::new("http://localhost/hook", None, Duration::from_secs(5)).unwrap();
        let signal = Signal {
            severity: Severity::Info,
            message: "x".repeat(5000),
            derived_price: 150.0,
            status: "report".to_string(),
            phase: Phase::MorningReport,
            timestamp: local_time(2024, 1, 10, 8, 0).unwrap(),
        };
        assert_eq!(sink.content(&signal).chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_payload_shape() {
        let json = serde_json::to_string(&WebhookPayload { content: "hi" }).unwrap();
        assert_eq!(json, r#"{"content":"hi"}"#);
    }
}
