//! Yahoo Finance chart API integration
//!
//! Provides free intraday bars, including FX pairs such as `USDJPY=X`.

use super::{FeedRequest, PriceFeed};
use crate::error::{GotobiError, Result};
use crate::types::{PriceBar, PriceSeries};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart feed (no API key required)
pub struct YahooChartFeed {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
}

impl YahooChartFeed {
    /// Create a new feed with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| GotobiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: YAHOO_CHART_URL.to_string(),
        })
    }

    /// Point the feed at another chart endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn chart_url(&self, request: &FeedRequest) -> String {
        format!(
            "{}/{}?interval={}&range={}",
            self.base_url, request.symbol, request.interval, request.lookback
        )
    }

    /// Parse a chart API body into bars, skipping entries without a close
    pub fn parse_chart(&self, body: &str) -> Result<PriceSeries> {
        let response: ChartResponse = serde_json::from_str(body)
            .map_err(|e| GotobiError::FeedFailure(format!("Chart parse error: {}", e)))?;

        if let Some(err) = response.chart.error {
            return Err(GotobiError::FeedFailure(format!(
                "Yahoo Finance returned error {}: {}",
                err.code, err.description
            )));
        }

        let result = response
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| GotobiError::FeedFailure("Empty chart result".to_string()))?;
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| GotobiError::FeedFailure("Missing quote block".to_string()))?;

        let mut bars = Vec::with_capacity(result.timestamp.len());
        for (i, &ts) in result.timestamp.iter().enumerate() {
            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };
            let high = quote.high.get(i).copied().flatten().unwrap_or(close);
            let low = quote.low.get(i).copied().flatten().unwrap_or(close);
            let timestamp = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| GotobiError::FeedFailure(format!("Invalid timestamp: {}", ts)))?;
            bars.push(PriceBar::new(timestamp, close, high, low));
        }

        if bars.is_empty() {
            return Err(GotobiError::FeedFailure("No usable bars in chart".to_string()));
        }
        PriceSeries::new(bars).map_err(|e| GotobiError::FeedFailure(e.to_string()))
    }
}

#[async_trait]
impl PriceFeed for YahooChartFeed {
    async fn fetch_recent_bars(&self, request: &FeedRequest) -> Result<PriceSeries> {
        let url = self.chart_url(request);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GotobiError::FeedFailure(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GotobiError::FeedFailure(format!(
                "Yahoo Finance returned error: {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| GotobiError::FeedFailure(format!("Failed to read response: {}", e)))?;

        self.parse_chart(&text)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}
