//! Error types for gotobi-signal

use thiserror::Error;

/// Main error type for gotobi-signal
#[derive(Error, Debug)]
pub enum GotobiError {
    #[error("Insufficient data: required {required} bars, available {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Source unavailable ({source_name}): {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Price feed failure: {0}")]
    FeedFailure(String),

    #[error("Delivery to {sink} failed: {reason}")]
    Delivery { sink: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl GotobiError {
    /// Shorthand for a per-candidate sentiment failure
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        GotobiError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for gotobi-signal operations
pub type Result<T> = std::result::Result<T, GotobiError>;
