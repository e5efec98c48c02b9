//! Core types and constants

use crate::error::{GotobiError, Result};
use crate::schedule::Phase;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MARKET_OFFSET_SECS: i32 = 9 * 3600;

/// Local civil offset for every calendar and phase rule (UTC+9, no DST)
pub const MARKET_TZ: FixedOffset = match FixedOffset::east_opt(MARKET_OFFSET_SECS) {
    Some(offset) => offset,
    None => panic!("market offset out of range"),
};

/// Timestamp in market-local time
pub type LocalTime = DateTime<FixedOffset>;

/// Price type (using f64 for precision)
pub type Price = f64;

/// Convert any UTC instant into market-local time
pub fn to_local(ts: DateTime<Utc>) -> LocalTime {
    ts.with_timezone(&MARKET_TZ)
}

/// Current instant in market-local time
pub fn local_now() -> LocalTime {
    to_local(Utc::now())
}

/// Build a local timestamp from civil fields, returning None for impossible dates
pub fn local_time(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<LocalTime> {
    MARKET_TZ
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
}

/// One bar of the quote series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub close: Price,
    pub high: Price,
    pub low: Price,
}

impl PriceBar {
    /// Create a new bar
    pub fn new(timestamp: DateTime<Utc>, close: Price, high: Price, low: Price) -> Self {
        Self {
            timestamp,
            close,
            high,
            low,
        }
    }
}

/// Chronologically ordered, non-empty sequence of bars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Wrap bars, rejecting empty or out-of-order input
    pub fn new(bars: Vec<PriceBar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(GotobiError::InsufficientData {
                required: 1,
                available: 0,
            });
        }
        if let Some(pair) = bars.windows(2).find(|w| w[1].timestamp < w[0].timestamp) {
            return Err(GotobiError::Parse(format!(
                "bars out of order: {} after {}",
                pair[1].timestamp, pair[0].timestamp
            )));
        }
        Ok(Self { bars })
    }

    /// Series built from closes only, one bar per minute from the Unix epoch
    pub fn from_closes(closes: &[Price]) -> Result<Self> {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let ts = DateTime::<Utc>::from(std::time::UNIX_EPOCH)
                    + chrono::Duration::minutes(i as i64);
                PriceBar::new(ts, c, c, c)
            })
            .collect();
        Self::new(bars)
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar
    pub fn last(&self) -> &PriceBar {
        // non-empty by construction
        &self.bars[self.bars.len() - 1]
    }

    /// Most recent close
    pub fn last_price(&self) -> Price {
        self.last().close
    }

    /// Closing prices of the trailing `window` bars, oldest first
    pub fn trailing_closes(&self, window: usize) -> Option<Vec<Price>> {
        if window == 0 || self.bars.len() < window {
            return None;
        }
        Some(
            self.bars[self.bars.len() - window..]
                .iter()
                .map(|b| b.close)
                .collect(),
        )
    }
}

/// Signal severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Action,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Action => "ACTION",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Severity::Info => "ℹ️",
            Severity::Action => "📈",
            Severity::Warning => "⚠️",
            Severity::Critical => "🚨",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory output of one decision run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub severity: Severity,
    pub message: String,
    pub derived_price: Price,
    pub status: String,
    pub phase: Phase,
    pub timestamp: LocalTime,
}

impl Signal {
    /// Render as a chat message, optionally followed by a footer line
    pub fn render(&self, footer: Option<&str>) -> String {
        let mut out = format!(
            "{} **[{}] {}**\n{}\nRate: {:.3} ({})",
            self.severity.icon(),
            self.severity,
            self.status,
            self.message,
            self.derived_price,
            self.timestamp.format("%Y-%m-%d %H:%M JST"),
        );
        if let Some(footer) = footer.filter(|f| !f.is_empty()) {
            out.push_str("\n*");
            out.push_str(footer);
            out.push('*');
        }
        out
    }
}
