//! Quote feed integrations
//!
//! - Yahoo Finance chart API: free intraday bars for FX pairs (`USDJPY=X`)
//! - In-memory feed for tests and dry runs

pub mod yahoo;

pub use yahoo::YahooChartFeed;

use crate::error::{GotobiError, Result};
use crate::types::{PriceBar, PriceSeries};
use async_trait::async_trait;

/// What to fetch from a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub symbol: String,
    /// Bar interval, e.g. `5m`
    pub interval: String,
    /// Lookback range, e.g. `1d`
    pub lookback: String,
}

impl FeedRequest {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>, lookback: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            lookback: lookback.into(),
        }
    }
}

/// Trait for quote feeds
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch recent bars, oldest first
    async fn fetch_recent_bars(&self, request: &FeedRequest) -> Result<PriceSeries>;

    /// Get the feed name
    fn name(&self) -> &str;
}

/// Feed serving a fixed set of bars
#[derive(Debug, Default)]
pub struct InMemoryPriceFeed {
    bars: Vec<PriceBar>,
}

impl InMemoryPriceFeed {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    /// Feed whose bars carry only closes
    pub fn from_closes(closes: &[f64]) -> Result<Self> {
        let series = PriceSeries::from_closes(closes)?;
        Ok(Self::new(series.bars().to_vec()))
    }
}

#[async_trait]
impl PriceFeed for InMemoryPriceFeed {
    async fn fetch_recent_bars(&self, request: &FeedRequest) -> Result<PriceSeries> {
        if self.bars.is_empty() {
            return Err(GotobiError::FeedFailure(format!(
                "no bars for {}",
                request.symbol
            )));
        }
        PriceSeries::new(self.bars.clone())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
