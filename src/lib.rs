//! # gotobi-signal
//!
//! Advisory signal engine for settlement-day ("gotobi") FX flows.
//!
//! Every run classifies the current Tokyo date against the settlement
//! calendar, computes a volatility envelope over recent quotes, optionally
//! reads an external sentiment page, and maps the time of day onto one of
//! the intraday windows to produce at most one [`Signal`](types::Signal).
//!
//! ## Example
//!
//! ```rust
//! use gotobi_signal::prelude::*;
//!
//! let decider = PhaseDecider::default();
//! let closes: Vec<f64> = (0..20).map(|i| 150.0 + (i % 4) as f64 * 0.05).collect();
//! let series = PriceSeries::from_closes(&closes).unwrap();
//!
//! // 2024-01-10 is a Wednesday settlement day; 10:00 is the unwind window
//! let now = local_time(2024, 1, 10, 10, 0).unwrap();
//! let signal = decider
//!     .decide(&now, Some(&series), &SentimentReading::neutral())
//!     .unwrap();
//! assert_eq!(signal.severity, Severity::Critical);
//! ```

pub mod bands;
pub mod calendar;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod phase;
pub mod schedule;
pub mod sentiment;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::bands::{BandEstimate, BandEstimator};
    pub use crate::calendar::{CalendarClassifier, DemandCategory, MonthEndRule, SettlementCalendar, SettlementDay};
    pub use crate::config::EngineConfig;
    pub use crate::data::{FeedRequest, PriceFeed, TextFetcher};
    pub use crate::dispatch::{Dispatcher, NotificationSink};
    pub use crate::engine::Engine;
    pub use crate::error::{GotobiError, Result};
    pub use crate::phase::{DecisionOptions, PhaseDecider};
    pub use crate::schedule::Phase;
    pub use crate::sentiment::{SentimentProbe, SentimentReading};
    pub use crate::types::*;
}
