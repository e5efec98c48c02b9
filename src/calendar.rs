//! Settlement-day calendar
//!
//! Settlement ("gotobi") days are the 5th, 10th, 15th, 20th, 25th and 30th of
//! the month when they fall on a weekday. A settlement date landing on a
//! weekend carries its demand forward to the following Monday.

use crate::error::{GotobiError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar-derived demand classification of a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DemandCategory {
    StrongBullish,
    Bullish,
    Bearish,
    Neutral,
}

impl DemandCategory {
    /// Human-readable description used in reports
    pub fn description(&self) -> &'static str {
        match self {
            DemandCategory::StrongBullish => "concentrated weekend demand",
            DemandCategory::Bullish => "import-side dollar demand",
            DemandCategory::Bearish => "export-side settlement",
            DemandCategory::Neutral => "no calendar bias",
        }
    }
}

impl fmt::Display for DemandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DemandCategory::StrongBullish => "StrongBullish",
            DemandCategory::Bullish => "Bullish",
            DemandCategory::Bearish => "Bearish",
            DemandCategory::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

/// How month-end settlement is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthEndRule {
    /// Only the 30th counts as month-end
    #[default]
    Thirtieth,
    /// Months without a 30th settle on their last day
    ShortMonthEnd,
}

/// Classification result for one date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementDay {
    pub date: NaiveDate,
    pub is_settlement_day: bool,
    pub category: DemandCategory,
    /// Weekend date whose demand was carried onto this Monday
    pub carried_from: Option<NaiveDate>,
}

/// Settlement calendar trait
pub trait SettlementCalendar: Send + Sync {
    /// Classify a single date
    fn classify(&self, date: NaiveDate) -> SettlementDay;

    /// Check if a date is a settlement day
    fn is_settlement_day(&self, date: NaiveDate) -> bool {
        self.classify(date).is_settlement_day
    }

    /// Get all settlement days between two dates (inclusive)
    fn settlement_days_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<SettlementDay> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| self.classify(d))
            .filter(|d| d.is_settlement_day)
            .collect()
    }

    /// Get all settlement days of a calendar month
    fn settlement_days_in_month(&self, year: i32, month: u32) -> Result<Vec<SettlementDay>> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| GotobiError::Parse(format!("Invalid month: {}-{:02}", year, month)))?;
        let end = start
            .iter_days()
            .take_while(|d| d.month() == month)
            .last()
            .unwrap_or(start);
        Ok(self.settlement_days_between(start, end))
    }
}

/// Gotobi settlement calendar in Tokyo time
#[derive(Debug, Clone, Default)]
pub struct CalendarClassifier {
    month_end: MonthEndRule,
}

impl CalendarClassifier {
    /// Create a classifier with the given month-end rule
    pub fn new(month_end: MonthEndRule) -> Self {
        Self { month_end }
    }

    /// Whether the date itself is a nominal settlement date, ignoring weekdays
    pub fn is_settlement_date(&self, date: NaiveDate) -> bool {
        date.day() % 5 == 0 || (self.month_end == MonthEndRule::ShortMonthEnd && is_short_month_end(date))
    }

    fn is_month_end(&self, date: NaiveDate) -> bool {
        date.day() == 30 || (self.month_end == MonthEndRule::ShortMonthEnd && is_short_month_end(date))
    }

    /// Weekend settlement date carried onto this date, if it is such a Monday
    fn carried_from(&self, date: NaiveDate) -> Option<NaiveDate> {
        if date.weekday() != Weekday::Mon {
            return None;
        }
        let sunday = date.pred_opt()?;
        let saturday = sunday.pred_opt()?;
        [saturday, sunday]
            .into_iter()
            .find(|d| self.is_settlement_date(*d))
    }
}

impl SettlementCalendar for CalendarClassifier {
    fn classify(&self, date: NaiveDate) -> SettlementDay {
        let carried_from = self.carried_from(date);
        let on_weekday = !is_weekend(date) && self.is_settlement_date(date);

        let category = if carried_from.is_some() {
            DemandCategory::StrongBullish
        } else if date.day() == 5 {
            DemandCategory::Bullish
        } else if self.is_month_end(date) {
            DemandCategory::Bearish
        } else {
            DemandCategory::Neutral
        };

        SettlementDay {
            date,
            is_settlement_day: on_weekday || carried_from.is_some(),
            category,
            carried_from,
        }
    }
}

/// Check if date is a weekend
fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Last day of a month that has no 30th
fn is_short_month_end(date: NaiveDate) -> bool {
    date.day() < 30 && date.succ_opt().map_or(true, |next| next.month() != date.month())
}
