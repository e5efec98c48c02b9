//! External data collaborators
//!
//! - `sources`: intraday quote feeds (`PriceFeed`)
//! - `text`: raw page fetches used by the sentiment probe (`TextFetcher`)

pub mod sources;
pub mod text;

pub use sources::{FeedRequest, InMemoryPriceFeed, PriceFeed, YahooChartFeed};
pub use text::{HttpTextFetcher, TextFetcher};
