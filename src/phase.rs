//! Phase decider
//!
//! Combines the settlement calendar, the volatility bands, the sentiment
//! reading and the time of day into at most one [`Signal`]. Nothing is kept
//! between calls: identical inputs always produce an identical result.

use crate::bands::{BandEstimate, BandEstimator};
use crate::calendar::{CalendarClassifier, SettlementCalendar, SettlementDay};
use crate::error::Result;
use crate::schedule::Phase;
use crate::sentiment::SentimentReading;
use crate::types::{LocalTime, Price, PriceSeries, Severity, Signal};

/// Entry trigger relaxation applied on bullish sentiment (5 basis points)
pub const BULLISH_RELAXATION: f64 = 1.0005;

pub const STATUS_REPORT: &str = "report";
pub const STATUS_ENTRY: &str = "entry";
pub const STATUS_STAND_ASIDE: &str = "stand-aside";
pub const STATUS_OVERSHOOT: &str = "overshoot";
pub const STATUS_RIDE: &str = "ride";
pub const STATUS_FLATTEN: &str = "flatten";
pub const STATUS_DIAGNOSTIC: &str = "diagnostic";

/// Switches that change which branches emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionOptions {
    /// Skip calendar and clock gating, always emit one diagnostic signal
    pub test_override: bool,
    /// Emit the "condition not met" branch of the positioning window
    pub emit_stand_aside: bool,
}

impl Default for DecisionOptions {
    fn default() -> Self {
        Self {
            test_override: false,
            emit_stand_aside: true,
        }
    }
}

/// Entry threshold for the positioning window
pub fn entry_threshold(lower_band: Price, sentiment: &SentimentReading) -> Price {
    if sentiment.is_bullish() {
        lower_band * BULLISH_RELAXATION
    } else {
        lower_band
    }
}

/// Stateless decision over calendar, bands, sentiment and clock
#[derive(Debug, Clone)]
pub struct PhaseDecider {
    calendar: CalendarClassifier,
    bands: BandEstimator,
    options: DecisionOptions,
}

impl PhaseDecider {
    pub fn new(calendar: CalendarClassifier, bands: BandEstimator, options: DecisionOptions) -> Self {
        Self {
            calendar,
            bands,
            options,
        }
    }

    pub fn options(&self) -> DecisionOptions {
        self.options
    }

    pub fn calendar(&self) -> &CalendarClassifier {
        &self.calendar
    }

    /// Whether any signal is possible at `now`, regardless of prices
    pub fn may_emit(&self, now: &LocalTime) -> bool {
        if self.options.test_override {
            return true;
        }
        match Phase::at(now) {
            Phase::MorningReport => true,
            Phase::Outside => false,
            _ => self.calendar.is_settlement_day(now.date_naive()),
        }
    }

    /// Whether the decision at `now` reads the sentiment score or note
    pub fn uses_sentiment(&self, now: &LocalTime) -> bool {
        self.options.test_override
            || matches!(Phase::at(now), Phase::MorningReport | Phase::Positioning)
    }

    /// Decide what, if anything, to emit at `now`.
    ///
    /// `series` is `None` when the price feed failed; no signal is produced
    /// then, since every signal carries a price.
    pub fn decide(
        &self,
        now: &LocalTime,
        series: Option<&PriceSeries>,
        sentiment: &SentimentReading,
    ) -> Option<Signal> {
        let Some(series) = series else {
            log::warn!("No price series available, skipping decision");
            return None;
        };

        let day = self.calendar.classify(now.date_naive());
        let bands = self.bands.estimate(series);
        let phase = Phase::at(now);
        log::debug!(
            "phase={} settlement={} category={} sentiment={}",
            phase,
            day.is_settlement_day,
            day.category,
            sentiment.note
        );
        if let Err(e) = &bands {
            log::debug!("Bands unavailable: {}", e);
        }

        let ctx = Inputs {
            now,
            phase,
            day,
            bands: &bands,
            sentiment,
            last_price: series.last_price(),
        };

        if self.options.test_override {
            return Some(self.diagnostic(&ctx));
        }

        match phase {
            Phase::MorningReport => Some(morning_report(&ctx)),
            _ if !day.is_settlement_day => None,
            Phase::Positioning => self.positioning(&ctx),
            Phase::Momentum => momentum(&ctx),
            Phase::Unwind => Some(unwind(&ctx)),
            Phase::Outside => None,
        }
    }

    fn positioning(&self, ctx: &Inputs<'_>) -> Option<Signal> {
        let bands = ctx.bands.as_ref().ok()?;
        let threshold = entry_threshold(bands.lower_band, ctx.sentiment);

        if bands.pierces_lower(threshold) {
            Some(ctx.signal(
                Severity::Action,
                STATUS_ENTRY,
                format!(
                    "Pull-back entry condition met: {:.3} <= threshold {:.3} ({}, {})",
                    bands.last_price,
                    threshold,
                    ctx.day.category.description(),
                    ctx.sentiment.note
                ),
            ))
        } else if self.options.emit_stand_aside {
            Some(ctx.signal(
                Severity::Info,
                STATUS_STAND_ASIDE,
                format!(
                    "Condition not met, standing aside: {:.3} > threshold {:.3}",
                    bands.last_price, threshold
                ),
            ))
        } else {
            None
        }
    }

    fn diagnostic(&self, ctx: &Inputs<'_>) -> Signal {
        let entry = match ctx.bands {
            Ok(bands) => {
                let threshold = entry_threshold(bands.lower_band, ctx.sentiment);
                format!(
                    "entry {} (threshold {:.3})",
                    if bands.pierces_lower(threshold) { "met" } else { "not met" },
                    threshold
                )
            }
            Err(_) => "entry not evaluated".to_string(),
        };
        ctx.signal(
            Severity::Info,
            STATUS_DIAGNOSTIC,
            format!(
                "Diagnostic run (override): phase {}; {}; {}; sentiment {}; {}",
                ctx.phase,
                describe_day(&ctx.day),
                describe_bands(ctx.bands),
                ctx.sentiment.note,
                entry
            ),
        )
    }
}

impl Default for PhaseDecider {
    fn default() -> Self {
        Self::new(
            CalendarClassifier::default(),
            BandEstimator::default(),
            DecisionOptions::default(),
        )
    }
}

/// Everything one decision looks at
struct Inputs<'a> {
    now: &'a LocalTime,
    phase: Phase,
    day: SettlementDay,
    bands: &'a Result<BandEstimate>,
    sentiment: &'a SentimentReading,
    last_price: Price,
}

impl Inputs<'_> {
    fn signal(&self, severity: Severity, status: &str, message: String) -> Signal {
        Signal {
            severity,
            message,
            derived_price: self.last_price,
            status: status.to_string(),
            phase: self.phase,
            timestamp: *self.now,
        }
    }
}

fn morning_report(ctx: &Inputs<'_>) -> Signal {
    ctx.signal(
        Severity::Info,
        STATUS_REPORT,
        format!(
            "Morning report: {}; sentiment {}; {}",
            describe_day(&ctx.day),
            ctx.sentiment.note,
            describe_bands(ctx.bands)
        ),
    )
}

fn momentum(ctx: &Inputs<'_>) -> Option<Signal> {
    let bands = ctx.bands.as_ref().ok()?;
    let signal = if bands.pierces_upper() {
        ctx.signal(
            Severity::Warning,
            STATUS_OVERSHOOT,
            format!(
                "Overshoot, do not chase: {:.3} >= upper band {:.3}",
                bands.last_price, bands.upper_band
            ),
        )
    } else {
        ctx.signal(
            Severity::Info,
            STATUS_RIDE,
            format!(
                "Momentum continuing, held positions may ride (upper band {:.3})",
                bands.upper_band
            ),
        )
    };
    Some(signal)
}

fn unwind(ctx: &Inputs<'_>) -> Signal {
    ctx.signal(
        Severity::Critical,
        STATUS_FLATTEN,
        "Flatten all positions before the fixing".to_string(),
    )
}

fn describe_day(day: &SettlementDay) -> String {
    let mut text = if day.is_settlement_day {
        format!(
            "settlement day ({}: {})",
            day.category,
            day.category.description()
        )
    } else {
        format!("not a settlement day ({})", day.category)
    };
    if let Some(from) = day.carried_from {
        text.push_str(&format!(", carried from {}", from));
    }
    text
}

fn describe_bands(bands: &Result<BandEstimate>) -> String {
    match bands {
        Ok(b) => format!("bands {:.3} / {:.3}", b.lower_band, b.upper_band),
        Err(e) => format!("bands unavailable ({})", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::Bias;
    use crate::types::local_time;
    use approx::assert_relative_eq;

    // 2024-01-10 is a Wednesday settlement day, 2024-01-09 an ordinary Tuesday
    fn at(day: u32, hour: u32, minute: u32) -> LocalTime {
        local_time(2024, 1, day, hour, minute).unwrap()
    }

    fn flat_series(price: f64) -> PriceSeries {
        let mut closes = vec![150.0, 151.0].repeat(10);
        closes.push(price);
        PriceSeries::from_closes(&closes).unwrap()
    }

    #[test]
    fn test_threshold_relaxation() {
        let neutral = SentimentReading::neutral();
        let bullish = SentimentReading::from_bias(Bias::Bullish, "test");
        assert_relative_eq!(entry_threshold(150.0, &neutral), 150.0);
        assert_relative_eq!(entry_threshold(150.0, &bullish), 150.075, epsilon = 1e-9);
    }

    #[test]
    fn test_no_series_no_signal() {
        let decider = PhaseDecider::default();
        let sentiment = SentimentReading::neutral();
        assert!(decider.decide(&at(10, 8, 15), None, &sentiment).is_none());
        assert!(decider.decide(&at(10, 10, 0), None, &sentiment).is_none());
    }

    #[test]
    fn test_outside_windows_silent() {
        let decider = PhaseDecider::default();
        let series = flat_series(150.5);
        let sentiment = SentimentReading::neutral();
        assert!(decider.decide(&at(10, 12, 0), Some(&series), &sentiment).is_none());
        assert!(decider.decide(&at(10, 8, 45), Some(&series), &sentiment).is_none());
    }

    #[test]
    fn test_momentum_branches() {
        let decider = PhaseDecider::default();
        let sentiment = SentimentReading::neutral();

        let ride = decider
            .decide(&at(10, 9, 15), Some(&flat_series(150.5)), &sentiment)
            .unwrap();
        assert_eq!(ride.severity, Severity::Info);
        assert_eq!(ride.status, STATUS_RIDE);

        let chase = decider
            .decide(&at(10, 9, 15), Some(&flat_series(160.0)), &sentiment)
            .unwrap();
        assert_eq!(chase.severity, Severity::Warning);
        assert_eq!(chase.status, STATUS_OVERSHOOT);
    }

    #[test]
    fn test_stand_aside_can_be_silenced() {
        let options = DecisionOptions {
            test_override: false,
            emit_stand_aside: false,
        };
        let decider = PhaseDecider::new(CalendarClassifier::default(), BandEstimator::default(), options);
        let sentiment = SentimentReading::neutral();
        assert!(decider
            .decide(&at(10, 7, 30), Some(&flat_series(150.5)), &sentiment)
            .is_none());
        let entry = decider
            .decide(&at(10, 7, 30), Some(&flat_series(140.0)), &sentiment)
            .unwrap();
        assert_eq!(entry.severity, Severity::Action);
    }

    #[test]
    fn test_override_emits_diagnostic_anywhere() {
        let options = DecisionOptions {
            test_override: true,
            emit_stand_aside: true,
        };
        let decider = PhaseDecider::new(CalendarClassifier::default(), BandEstimator::default(), options);
        let series = PriceSeries::from_closes(&[150.0, 150.2]).unwrap();
        let signal = decider
            .decide(&at(9, 13, 0), Some(&series), &SentimentReading::degraded("offline"))
            .unwrap();
        assert_eq!(signal.severity, Severity::Info);
        assert_eq!(signal.status, STATUS_DIAGNOSTIC);
        assert!(signal.message.contains("not a settlement day"));
        assert!(signal.message.contains("bands unavailable"));
        assert!(signal.message.contains("sentiment unavailable"));
        assert_eq!(signal.derived_price, 150.2);
    }
}
