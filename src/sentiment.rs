//! External sentiment probe
//!
//! Candidate pages are fetched in order through a [`TextFetcher`]. The first
//! page that yields visible text is classified by keyword containment and the
//! remaining candidates are skipped. When every candidate fails the probe
//! returns a degraded reading, which callers treat as neutral.

use crate::data::text::TextFetcher;
use crate::error::{GotobiError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const BULLISH_SCORE: f64 = 1.2;
pub const BEARISH_SCORE: f64 = 0.8;
pub const NEUTRAL_SCORE: f64 = 1.0;

/// Visible text kept per page; keywords past this point are ignored
pub const MAX_SNIPPET_CHARS: usize = 280;

/// One candidate page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentSource {
    pub name: String,
    pub url: String,
}

impl SentimentSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Built-in candidate pages, tried in this order
pub fn default_sources() -> Vec<SentimentSource> {
    vec![
        SentimentSource::new("minkabu", "https://fx.minkabu.jp/pair/USDJPY"),
        SentimentSource::new("yahoo-jp", "https://finance.yahoo.co.jp/quote/USDJPY=FX"),
        SentimentSource::new("kabutan", "https://kabutan.jp/news/marketnews/?category=9"),
    ]
}

/// Keyword lists used for classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keywords {
    pub bullish: Vec<String>,
    pub bearish: Vec<String>,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            bullish: ["上昇", "円安", "ドル高", "bullish"].map(String::from).to_vec(),
            bearish: ["下落", "円高", "ドル安", "bearish"].map(String::from).to_vec(),
        }
    }
}

/// Direction read from a snippet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Bias {
    pub fn score(&self) -> f64 {
        match self {
            Bias::Bullish => BULLISH_SCORE,
            Bias::Bearish => BEARISH_SCORE,
            Bias::Neutral => NEUTRAL_SCORE,
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Bias::Bullish => "bullish",
            Bias::Bearish => "bearish",
            Bias::Neutral => "neutral",
        };
        f.write_str(label)
    }
}

/// Classify text by keyword containment; bullish keywords win ties
pub fn classify(snippet: &str, keywords: &Keywords) -> Bias {
    let haystack = snippet.to_lowercase();
    let hit = |words: &[String]| {
        words
            .iter()
            .filter(|w| !w.is_empty())
            .any(|w| haystack.contains(&w.to_lowercase()))
    };

    if hit(&keywords.bullish) {
        Bias::Bullish
    } else if hit(&keywords.bearish) {
        Bias::Bearish
    } else {
        Bias::Neutral
    }
}

/// Result of one probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    /// Absent when degraded
    pub score: Option<f64>,
    pub note: String,
    pub degraded: bool,
    /// Name of the source that answered
    pub source: Option<String>,
}

impl SentimentReading {
    /// Reading from a successfully classified source
    pub fn from_bias(bias: Bias, source: &str) -> Self {
        Self {
            score: Some(bias.score()),
            note: format!("{} via {}", bias, source),
            degraded: false,
            source: Some(source.to_string()),
        }
    }

    /// Reading substituted when no source could be used
    pub fn degraded(reason: impl fmt::Display) -> Self {
        Self {
            score: None,
            note: format!("sentiment unavailable ({})", reason),
            degraded: true,
            source: None,
        }
    }

    /// Neutral reading
    pub fn neutral() -> Self {
        Self {
            score: Some(NEUTRAL_SCORE),
            note: "neutral".to_string(),
            degraded: false,
            source: None,
        }
    }

    /// Score used by decisions; degraded readings count as neutral
    pub fn effective_score(&self) -> f64 {
        self.score.unwrap_or(NEUTRAL_SCORE)
    }

    pub fn is_bullish(&self) -> bool {
        self.effective_score() > NEUTRAL_SCORE
    }
}

/// Turns a raw page into visible text
#[derive(Debug, Clone)]
pub struct SnippetExtractor {
    hidden: Regex,
    tag: Regex,
    space: Regex,
}

impl SnippetExtractor {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| GotobiError::Config(format!("Invalid pattern: {}", e)))
        };
        Ok(Self {
            hidden: compile(r"(?is)<(script|style|noscript)\b.*?</(script|style|noscript)>")?,
            // quoted attribute values may contain '>'
            tag: compile(r#"(?s)<(?:[^>"']|"[^"]*"|'[^']*')*>"#)?,
            space: compile(r"\s+")?,
        })
    }

    /// Visible text of `raw`, or None if nothing remains
    pub fn extract(&self, raw: &str) -> Option<String> {
        let text = self.hidden.replace_all(raw, " ");
        let text = self.tag.replace_all(&text, " ");
        let text = decode_entities(&text);
        let text = self.space.replace_all(&text, " ");
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(text.chars().take(MAX_SNIPPET_CHARS).collect())
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Ordered multi-source sentiment probe
#[derive(Debug, Clone)]
pub struct SentimentProbe {
    sources: Vec<SentimentSource>,
    keywords: Keywords,
    timeout: Duration,
    extractor: SnippetExtractor,
}

impl SentimentProbe {
    pub fn new(sources: Vec<SentimentSource>, keywords: Keywords, timeout: Duration) -> Result<Self> {
        Ok(Self {
            sources,
            keywords,
            timeout,
            extractor: SnippetExtractor::new()?,
        })
    }

    pub fn sources(&self) -> &[SentimentSource] {
        &self.sources
    }

    /// Try each candidate in order, stopping at the first usable one
    pub async fn probe(&self, fetcher: &dyn TextFetcher) -> SentimentReading {
        let mut last_failure: Option<GotobiError> = None;

        for source in &self.sources {
            match self.try_source(fetcher, source).await {
                Ok(reading) => {
                    log::info!("Sentiment from {}: {}", source.name, reading.note);
                    return reading;
                }
                Err(e) => {
                    log::warn!("Sentiment source {} failed: {}", source.name, e);
                    last_failure = Some(e);
                }
            }
        }

        match last_failure {
            Some(GotobiError::SourceUnavailable { source_name, reason }) => {
                SentimentReading::degraded(format!("{}: {}", source_name, reason))
            }
            Some(other) => SentimentReading::degraded(other),
            None => SentimentReading::degraded("no sentiment sources configured"),
        }
    }

    async fn try_source(
        &self,
        fetcher: &dyn TextFetcher,
        source: &SentimentSource,
    ) -> Result<SentimentReading> {
        let raw = tokio::time::timeout(self.timeout, fetcher.fetch(&source.url, self.timeout))
            .await
            .map_err(|_| {
                GotobiError::source_unavailable(
                    &source.name,
                    format!("timed out after {}s", self.timeout.as_secs()),
                )
            })?
            .map_err(|e| match e {
                GotobiError::SourceUnavailable { reason, .. } => {
                    GotobiError::source_unavailable(&source.name, reason)
                }
                other => GotobiError::source_unavailable(&source.name, other.to_string()),
            })?;

        let snippet = self
            .extractor
            .extract(&raw)
            .ok_or_else(|| GotobiError::source_unavailable(&source.name, "empty extraction"))?;

        Ok(SentimentReading::from_bias(
            classify(&snippet, &self.keywords),
            &source.name,
        ))
    }
}
