//! Terminal sink

use super::NotificationSink;
use crate::error::Result;
use crate::types::{Severity, Signal};
use async_trait::async_trait;
use colored::Colorize;

/// Prints rendered signals to stdout
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    footer: Option<String>,
}

impl ConsoleSink {
    pub fn new(footer: Option<String>) -> Self {
        Self { footer }
    }
}

#[async_trait]
impl NotificationSink for ConsoleSink {
    async fn deliver(&self, signal: &Signal) -> Result<()> {
        let rendered = signal.render(self.footer.as_deref());
        let text = rendered.as_str();
        let text = match signal.severity {
            Severity::Info => text.normal(),
            Severity::Action => text.green().bold(),
            Severity::Warning => text.yellow().bold(),
            Severity::Critical => text.red().bold(),
        };
        println!("{}", text);
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
