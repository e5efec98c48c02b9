//! Decision table tests for the phase decider
//!
//! Covers heartbeat precedence, the unwind deadline, the entry threshold with
//! and without the bullish relaxation, and settlement-day gating.

use approx::assert_relative_eq;
use gotobi_signal::bands::BandEstimator;
use gotobi_signal::calendar::CalendarClassifier;
use gotobi_signal::phase::{entry_threshold, DecisionOptions, PhaseDecider, STATUS_ENTRY, STATUS_FLATTEN, STATUS_OVERSHOOT, STATUS_REPORT, STATUS_STAND_ASIDE};
use gotobi_signal::schedule::Phase;
use gotobi_signal::sentiment::{Bias, SentimentReading};
use gotobi_signal::types::{local_time, LocalTime, PriceSeries, Severity};

const WINDOW: usize = 10;

// 2024-01-10 is a Wednesday settlement day; 2024-01-09 is an ordinary Tuesday
fn settlement_day(hour: u32, minute: u32) -> LocalTime {
    local_time(2024, 1, 10, hour, minute).unwrap()
}

fn ordinary_day(hour: u32, minute: u32) -> LocalTime {
    local_time(2024, 1, 9, hour, minute).unwrap()
}

fn decider() -> PhaseDecider {
    PhaseDecider::new(
        CalendarClassifier::default(),
        BandEstimator::new(WINDOW, 2.0).unwrap(),
        DecisionOptions::default(),
    )
}

fn history() -> Vec<f64> {
    vec![150.0, 150.4, 150.2, 150.6, 150.1, 150.5, 150.3, 150.7, 150.2, 150.4]
}

/// Series whose last close is placed relative to the lower band of that same series
fn series_with_last_offset(offset: f64) -> (PriceSeries, f64) {
    // The band depends on the last close, so iterate to a fixed point
    let mut last = 150.0;
    for _ in 0..200 {
        let mut closes = history();
        closes.push(last);
        let series = PriceSeries::from_closes(&closes).unwrap();
        let lower = BandEstimator::new(WINDOW, 2.0).unwrap().estimate(&series).unwrap().lower_band;
        let target = lower + offset;
        if (target - last).abs() < 1e-12 {
            break;
        }
        last = target;
    }
    let mut closes = history();
    closes.push(last);
    let series = PriceSeries::from_closes(&closes).unwrap();
    let lower = BandEstimator::new(WINDOW, 2.0).unwrap().estimate(&series).unwrap().lower_band;
    (series, lower)
}

#[test]
fn test_morning_report_always_emits() {
    let short = PriceSeries::from_closes(&[150.0]).unwrap();
    let (full, _) = series_with_last_offset(-0.01);
    let readings = [
        SentimentReading::neutral(),
        SentimentReading::degraded("all sources down"),
        SentimentReading::from_bias(Bias::Bearish, "test"),
    ];

    for now in [settlement_day(8, 15), ordinary_day(8, 15), ordinary_day(8, 0), ordinary_day(8, 30)] {
        for series in [&short, &full] {
            for sentiment in &readings {
                let signal = decider().decide(&now, Some(series), sentiment).unwrap();
                assert_eq!(signal.severity, Severity::Info);
                assert_eq!(signal.status, STATUS_REPORT);
                assert_eq!(signal.phase, Phase::MorningReport);
            }
        }
    }
}

#[test]
fn test_unwind_ignores_bands_and_sentiment() {
    let short = PriceSeries::from_closes(&[150.0, 149.0]).unwrap();
    let degraded = SentimentReading::degraded("timed out after 15s");

    for (hour, minute) in [(9, 50), (10, 0), (10, 10)] {
        let signal = decider()
            .decide(&settlement_day(hour, minute), Some(&short), &degraded)
            .unwrap();
        assert_eq!(signal.severity, Severity::Critical);
        assert_eq!(signal.status, STATUS_FLATTEN);
        assert_eq!(signal.derived_price, 149.0);
    }
}

#[test]
fn test_entry_below_lower_band_with_neutral_sentiment() {
    let (series, lower) = series_with_last_offset(-0.01);
    assert_relative_eq!(series.last_price(), lower - 0.01, epsilon = 1e-9);

    let signal = decider()
        .decide(&settlement_day(7, 30), Some(&series), &SentimentReading::neutral())
        .unwrap();
    assert_eq!(signal.severity, Severity::Action);
    assert_eq!(signal.status, STATUS_ENTRY);
}

#[test]
fn test_price_exactly_on_the_bands() {
    // A flat window has zero deviation, so the last close equals both bands exactly
    let series = PriceSeries::from_closes(&[150.0; WINDOW]).unwrap();
    let bands = BandEstimator::new(WINDOW, 2.0).unwrap().estimate(&series).unwrap();
    assert_eq!(bands.lower_band, series.last_price());
    assert_eq!(bands.upper_band, series.last_price());
    let neutral = SentimentReading::neutral();
    assert_eq!(entry_threshold(bands.lower_band, &neutral), series.last_price());

    let entry = decider()
        .decide(&settlement_day(7, 30), Some(&series), &neutral)
        .unwrap();
    assert_eq!(entry.severity, Severity::Action);
    assert_eq!(entry.status, STATUS_ENTRY);

    let overshoot = decider()
        .decide(&settlement_day(9, 15), Some(&series), &neutral)
        .unwrap();
    assert_eq!(overshoot.severity, Severity::Warning);
    assert_eq!(overshoot.status, STATUS_OVERSHOOT);
}

#[test]
fn test_bullish_relaxation_flips_the_margin() {
    let (series, lower) = series_with_last_offset(0.01);
    assert_relative_eq!(series.last_price(), lower + 0.01, epsilon = 1e-9);

    let bullish = SentimentReading::from_bias(Bias::Bullish, "test");
    let neutral = SentimentReading::neutral();
    // 5bp of ~150 is ~0.075, comfortably above the 0.01 margin
    assert!(entry_threshold(lower, &bullish) > series.last_price());
    assert_relative_eq!(entry_threshold(lower, &neutral), lower);

    let with_bullish = decider()
        .decide(&settlement_day(7, 30), Some(&series), &bullish)
        .unwrap();
    assert_eq!(with_bullish.severity, Severity::Action);

    let with_neutral = decider()
        .decide(&settlement_day(7, 30), Some(&series), &neutral)
        .unwrap();
    assert_eq!(with_neutral.severity, Severity::Info);
    assert_eq!(with_neutral.status, STATUS_STAND_ASIDE);
}

#[test]
fn test_degraded_sentiment_uses_unrelaxed_threshold() {
    let (series, _) = series_with_last_offset(0.01);
    let signal = decider()
        .decide(&settlement_day(7, 30), Some(&series), &SentimentReading::degraded("offline"))
        .unwrap();
    assert_eq!(signal.status, STATUS_STAND_ASIDE);
}

#[test]
fn test_non_settlement_day_is_silent_outside_report() {
    let (series, _) = series_with_last_offset(-0.01);
    let sentiment = SentimentReading::neutral();
    for (hour, minute) in [(7, 30), (9, 15), (10, 0)] {
        assert!(decider()
            .decide(&ordinary_day(hour, minute), Some(&series), &sentiment)
            .is_none());
    }
}

#[test]
fn test_positioning_needs_enough_bars() {
    let short = PriceSeries::from_closes(&[150.0; WINDOW - 1]).unwrap();
    assert!(decider()
        .decide(&settlement_day(7, 30), Some(&short), &SentimentReading::neutral())
        .is_none());
    assert!(decider()
        .decide(&settlement_day(9, 15), Some(&short), &SentimentReading::neutral())
        .is_none());
}

#[test]
fn test_monday_carry_day_is_gated_in() {
    // Saturday 2024-05-25 carries onto Monday 2024-05-27
    let now = local_time(2024, 5, 27, 10, 0).unwrap();
    let (series, _) = series_with_last_offset(0.5);
    let signal = decider()
        .decide(&now, Some(&series), &SentimentReading::neutral())
        .unwrap();
    assert_eq!(signal.severity, Severity::Critical);
}

#[test]
fn test_identical_inputs_identical_output() {
    let (series, _) = series_with_last_offset(-0.01);
    let sentiment = SentimentReading::from_bias(Bias::Bullish, "test");
    for now in [settlement_day(7, 30), settlement_day(8, 10), settlement_day(9, 10), ordinary_day(12, 0)] {
        let first = decider().decide(&now, Some(&series), &sentiment);
        let second = decider().decide(&now, Some(&series), &sentiment);
        assert_eq!(first, second);
    }
}
