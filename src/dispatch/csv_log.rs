//! Append-only CSV signal log

use super::NotificationSink;
use crate::error::Result;
use crate::types::Signal;
use async_trait::async_trait;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct LogRow<'a> {
    timestamp: String,
    severity: &'a str,
    status: &'a str,
    price: f64,
    message: &'a str,
}

/// Appends one row per signal, writing a header into new files
#[derive(Debug, Clone)]
pub struct CsvLogSink {
    path: PathBuf,
}

impl CsvLogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, signal: &Signal) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let is_new = std::fs::metadata(&self.path).map_or(true, |m| m.len() == 0);
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(LogRow {
            timestamp: signal.timestamp.to_rfc3339(),
            severity: signal.severity.as_str(),
            status: &signal.status,
            price: signal.derived_price,
            message: &signal.message,
        })?;
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for CsvLogSink {
    async fn deliver(&self, signal: &Signal) -> Result<()> {
        self.append(signal)
    }

    fn name(&self) -> &str {
        "csv-log"
    }
}
