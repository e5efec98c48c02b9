//! One-shot signal engine
//!
//! Each run fetches prices, probes sentiment, decides, and only then hands the
//! signal to the dispatcher. No state survives between runs.

use crate::config::EngineConfig;
use crate::data::sources::{FeedRequest, PriceFeed, YahooChartFeed};
use crate::data::text::{HttpTextFetcher, TextFetcher};
use crate::dispatch::{ConsoleSink, CsvLogSink, Dispatcher, DiscordWebhook};
use crate::error::Result;
use crate::phase::PhaseDecider;
use crate::sentiment::{SentimentProbe, SentimentReading};
use crate::types::{LocalTime, PriceSeries, Signal};

/// Signal engine wired to its collaborators
pub struct Engine {
    feed: Box<dyn PriceFeed>,
    fetcher: Box<dyn TextFetcher>,
    dispatcher: Dispatcher,
    decider: PhaseDecider,
    probe: SentimentProbe,
    request: FeedRequest,
}

impl Engine {
    /// Create an engine with explicit collaborators
    pub fn new(
        config: &EngineConfig,
        feed: Box<dyn PriceFeed>,
        fetcher: Box<dyn TextFetcher>,
        dispatcher: Dispatcher,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            feed,
            fetcher,
            dispatcher,
            decider: config.decider()?,
            probe: config.probe()?,
            request: FeedRequest::new(&config.symbol, &config.interval, &config.lookback),
        })
    }

    /// Create an engine using HTTP collaborators and the sinks named in `config`
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let feed = YahooChartFeed::new(config.fetch_timeout())?;
        let fetcher = HttpTextFetcher::new()?;
        let dispatcher = build_dispatcher(config)?;
        Self::new(config, Box::new(feed), Box::new(fetcher), dispatcher)
    }

    /// Replace the dispatcher, e.g. for dry runs
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn decider(&self) -> &PhaseDecider {
        &self.decider
    }

    /// Gather inputs and decide, without delivering
    pub async fn evaluate(&self, now: &LocalTime) -> Option<Signal> {
        if !self.decider.may_emit(now) {
            log::info!("Nothing to evaluate at {}", now.format("%Y-%m-%d %H:%M"));
            return None;
        }

        let series = self.fetch_series().await;
        let sentiment = if self.decider.uses_sentiment(now) {
            self.probe.probe(self.fetcher.as_ref()).await
        } else {
            SentimentReading::neutral()
        };

        self.decider.decide(now, series.as_ref(), &sentiment)
    }

    /// Evaluate and deliver; returns the delivered signal, if any
    pub async fn run_once(&self, now: &LocalTime) -> Option<Signal> {
        let signal = self.evaluate(now).await;
        match &signal {
            Some(signal) => {
                log::info!("Signal {} ({})", signal.status, signal.severity);
                self.dispatcher.deliver(signal).await;
            }
            None => log::info!("No signal at {}", now.format("%Y-%m-%d %H:%M")),
        }
        signal
    }

    async fn fetch_series(&self) -> Option<PriceSeries> {
        match self.feed.fetch_recent_bars(&self.request).await {
            Ok(series) => Some(series),
            Err(e) => {
                log::warn!("Price feed {} failed: {}", self.feed.name(), e);
                None
            }
        }
    }
}

/// Sinks named in the config: console, CSV log, Discord webhook
pub fn build_dispatcher(config: &EngineConfig) -> Result<Dispatcher> {
    let mut dispatcher = Dispatcher::new();
    if config.console {
        dispatcher.add_sink(ConsoleSink::new(config.footer.clone()));
    }
    if let Some(path) = &config.csv_log_path {
        dispatcher.add_sink(CsvLogSink::new(path));
    }
    if let Some(url) = &config.discord_webhook_url {
        dispatcher.add_sink(DiscordWebhook::new(
            url,
            config.footer.clone(),
            config.fetch_timeout(),
        )?);
    }
    Ok(dispatcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sources::InMemoryPriceFeed;
    use crate::dispatch::RecordingSink;
    use crate::error::GotobiError;
    use crate::types::{local_time, Severity};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct CountingFetcher {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TextFetcher for CountingFetcher {
        async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GotobiError::source_unavailable(url, "offline"))
        }
    }

    fn engine(fetcher: CountingFetcher, recorder: RecordingSink) -> Engine {
        let config = EngineConfig {
            console: false,
            ..EngineConfig::default()
        };
        let closes: Vec<f64> = (0..30).map(|i| 150.0 + (i % 3) as f64 * 0.1).collect();
        Engine::new(
            &config,
            Box::new(InMemoryPriceFeed::from_closes(&closes).unwrap()),
            Box::new(fetcher),
            Dispatcher::new().with_sink(recorder),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_outside_windows_skips_fetches() {
        let fetcher = CountingFetcher::default();
        let recorder = RecordingSink::new();
        let engine = engine(fetcher.clone(), recorder.clone());

        let signal = engine.run_once(&local_time(2024, 1, 10, 13, 0).unwrap()).await;

        assert!(signal.is_none());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(recorder.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_unwind_delivers_without_probing() {
        let fetcher = CountingFetcher::default();
        let recorder = RecordingSink::new();
        let engine = engine(fetcher.clone(), recorder.clone());

        let signal = engine
            .run_once(&local_time(2024, 1, 10, 10, 0).unwrap())
            .await
            .unwrap();

        assert_eq!(signal.severity, Severity::Critical);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.delivered(), vec![signal]);
    }

    #[tokio::test]
    async fn test_morning_report_with_degraded_sentiment() {
        let fetcher = CountingFetcher::default();
        let recorder = RecordingSink::new();
        let engine = engine(fetcher.clone(), recorder.clone());

        let signal = engine
            .run_once(&local_time(2024, 1, 9, 8, 15).unwrap())
            .await
            .unwrap();

        assert_eq!(signal.severity, Severity::Info);
        assert!(signal.message.contains("sentiment unavailable"));
        // every default candidate was tried
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_dispatcher_from_config() {
        let config = EngineConfig {
            csv_log_path: Some("signals.csv".into()),
            discord_webhook_url: Some("https://discord.example/hook".to_string()),
            ..EngineConfig::default()
        };
        let dispatcher = build_dispatcher(&config).unwrap();
        assert_eq!(dispatcher.sink_names(), vec!["console", "csv-log", "discord"]);
    }
}
