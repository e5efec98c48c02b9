//! Engine configuration
//!
//! Loaded from TOML (`--config <path>` or `~/.gotobi/config.toml`), then
//! overridden from the environment. Every field has a default, so an empty
//! file is a valid configuration.

use crate::bands::{BandEstimator, DEFAULT_MULTIPLIER, DEFAULT_WINDOW};
use crate::calendar::{CalendarClassifier, MonthEndRule};
use crate::error::{GotobiError, Result};
use crate::phase::{DecisionOptions, PhaseDecider};
use crate::sentiment::{default_sources, Keywords, SentimentProbe, SentimentSource};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const WEBHOOK_ENV: &str = "DISCORD_WEBHOOK_URL";
pub const OVERRIDE_ENV: &str = "GOTOBI_TEST_OVERRIDE";

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub symbol: String,
    pub interval: String,
    pub lookback: String,
    pub band_window: usize,
    pub settlement_multiplier: f64,
    pub test_override: bool,
    pub emit_stand_aside: bool,
    pub month_end: MonthEndRule,
    pub fetch_timeout_secs: u64,
    pub sentiment_sources: Vec<SentimentSource>,
    pub bullish_keywords: Vec<String>,
    pub bearish_keywords: Vec<String>,
    pub discord_webhook_url: Option<String>,
    pub csv_log_path: Option<PathBuf>,
    pub console: bool,
    pub footer: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let keywords = Keywords::default();
        Self {
            symbol: "USDJPY=X".to_string(),
            interval: "5m".to_string(),
            lookback: "1d".to_string(),
            band_window: DEFAULT_WINDOW,
            settlement_multiplier: DEFAULT_MULTIPLIER,
            test_override: false,
            emit_stand_aside: true,
            month_end: MonthEndRule::default(),
            fetch_timeout_secs: 15,
            sentiment_sources: default_sources(),
            bullish_keywords: keywords.bullish,
            bearish_keywords: keywords.bearish,
            discord_webhook_url: None,
            csv_log_path: None,
            console: true,
            footer: None,
        }
    }
}

impl EngineConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".gotobi").join("config.toml"))
    }

    /// Parse a TOML document
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| GotobiError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from an explicit path, else the default location, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            let contents = fs::read_to_string(config_path).map_err(|e| {
                GotobiError::Config(format!("Failed to read {}: {}", config_path.display(), e))
            })?;
            return Self::from_toml(&contents);
        }

        if let Some(default_config) = Self::default_path().filter(|p| p.exists()) {
            match fs::read_to_string(&default_config).map_err(GotobiError::from).and_then(|c| Self::from_toml(&c)) {
                Ok(config) => return Ok(config),
                Err(e) => log::warn!("Ignoring {}: {}", default_config.display(), e),
            }
        }

        Ok(Self::default())
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(WEBHOOK_ENV).filter(|u| !u.trim().is_empty()) {
            self.discord_webhook_url = Some(url);
        }
        if let Some(flag) = lookup(OVERRIDE_ENV) {
            self.test_override = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    /// Apply overrides from the process environment
    pub fn with_process_env(mut self) -> Self {
        self.apply_env(|key| std::env::var(key).ok());
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.band_window < 2 {
            return Err(GotobiError::Config(format!(
                "band_window must be at least 2, got {}",
                self.band_window
            )));
        }
        if !(self.settlement_multiplier.is_finite() && self.settlement_multiplier > 0.0) {
            return Err(GotobiError::Config(format!(
                "settlement_multiplier must be positive, got {}",
                self.settlement_multiplier
            )));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(GotobiError::Config("fetch_timeout_secs must be positive".to_string()));
        }
        if self.symbol.trim().is_empty() {
            return Err(GotobiError::Config("symbol must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn keywords(&self) -> Keywords {
        Keywords {
            bullish: self.bullish_keywords.clone(),
            bearish: self.bearish_keywords.clone(),
        }
    }

    pub fn calendar(&self) -> CalendarClassifier {
        CalendarClassifier::new(self.month_end)
    }

    pub fn decision_options(&self) -> DecisionOptions {
        DecisionOptions {
            test_override: self.test_override,
            emit_stand_aside: self.emit_stand_aside,
        }
    }

    /// Build the decider described by this config
    pub fn decider(&self) -> Result<PhaseDecider> {
        let bands = BandEstimator::new(self.band_window, self.settlement_multiplier)?;
        Ok(PhaseDecider::new(self.calendar(), bands, self.decision_options()))
    }

    /// Build the sentiment probe described by this config
    pub fn probe(&self) -> Result<SentimentProbe> {
        SentimentProbe::new(self.sentiment_sources.clone(), self.keywords(), self.fetch_timeout())
    }
}
