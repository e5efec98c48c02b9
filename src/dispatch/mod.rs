//! Signal delivery
//!
//! A [`Dispatcher`] forwards each signal to every configured sink. Delivery is
//! fire-and-forget: sink failures are logged and never reach the caller.

pub mod console;
pub mod csv_log;
pub mod discord;

pub use console::ConsoleSink;
pub use csv_log::CsvLogSink;
pub use discord::DiscordWebhook;

use crate::error::Result;
use crate::types::Signal;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A destination for signals
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one signal
    async fn deliver(&self, signal: &Signal) -> Result<()>;

    /// Get the sink name
    fn name(&self) -> &str;
}

/// Fans a signal out to all sinks
#[derive(Default)]
pub struct Dispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl Dispatcher {
    /// Create a new empty dispatcher
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Register a sink
    pub fn add_sink<S: NotificationSink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    /// Builder-style [`Dispatcher::add_sink`]
    pub fn with_sink<S: NotificationSink + 'static>(mut self, sink: S) -> Self {
        self.add_sink(sink);
        self
    }

    /// Names of registered sinks, in delivery order
    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_string()).collect()
    }

    /// Deliver to every sink; failures are logged and skipped
    pub async fn deliver(&self, signal: &Signal) {
        if self.sinks.is_empty() {
            log::warn!("No sinks configured, signal {} not delivered", signal.status);
            return;
        }
        for sink in &self.sinks {
            match sink.deliver(signal).await {
                Ok(()) => log::debug!("Delivered {} to {}", signal.status, sink.name()),
                Err(e) => log::warn!("Sink {} failed: {}", sink.name(), e),
            }
        }
    }
}

/// Sink that keeps delivered signals in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    delivered: Arc<Mutex<Vec<Signal>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals delivered so far
    pub fn delivered(&self) -> Vec<Signal> {
        self.delivered.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, signal: &Signal) -> Result<()> {
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(signal.clone());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
