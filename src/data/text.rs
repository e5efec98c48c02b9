//! Raw text fetching for sentiment sources

use crate::error::{GotobiError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Fetches the raw body of a page
#[async_trait]
pub trait TextFetcher: Send + Sync {
    /// Fetch `url`, giving up after `timeout`
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// HTTP implementation backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTextFetcher {
    client: Client,
}

impl HttpTextFetcher {
    /// Create a new fetcher with a browser user agent
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GotobiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl TextFetcher for HttpTextFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| GotobiError::source_unavailable(url, format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GotobiError::source_unavailable(
                url,
                format!("returned status {}", response.status()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| GotobiError::source_unavailable(url, format!("Failed to read response: {}", e)))
    }
}
