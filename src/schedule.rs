//! Intraday trading windows in Tokyo time

use crate::types::LocalTime;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Clock range at minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: u32,
    end: u32,
    end_inclusive: bool,
}

impl TimeWindow {
    /// Half-open window [start, end)
    pub const fn half_open(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> Self {
        Self {
            start: start_h * 60 + start_m,
            end: end_h * 60 + end_m,
            end_inclusive: false,
        }
    }

    /// Closed window [start, end]
    pub const fn closed(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> Self {
        Self {
            start: start_h * 60 + start_m,
            end: end_h * 60 + end_m,
            end_inclusive: true,
        }
    }

    /// Check whether a clock time falls inside; seconds are ignored
    pub fn contains(&self, time: NaiveTime) -> bool {
        let minute = time.hour() * 60 + time.minute();
        if self.end_inclusive {
            (self.start..=self.end).contains(&minute)
        } else {
            (self.start..self.end).contains(&minute)
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:02}:{:02}, {:02}:{:02}{}",
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60,
            if self.end_inclusive { "]" } else { ")" }
        )
    }
}

pub const MORNING_REPORT: TimeWindow = TimeWindow::closed(8, 0, 8, 30);
pub const POSITIONING: TimeWindow = TimeWindow::half_open(7, 0, 8, 0);
pub const MOMENTUM: TimeWindow = TimeWindow::half_open(9, 0, 9, 50);
pub const UNWIND: TimeWindow = TimeWindow::closed(9, 50, 10, 10);

/// Trading window a timestamp falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    MorningReport,
    Positioning,
    Momentum,
    Unwind,
    Outside,
}

impl Phase {
    /// Evaluation order; the morning report is checked first
    const ORDER: [(Phase, TimeWindow); 4] = [
        (Phase::MorningReport, MORNING_REPORT),
        (Phase::Positioning, POSITIONING),
        (Phase::Momentum, MOMENTUM),
        (Phase::Unwind, UNWIND),
    ];

    /// Classify a clock time
    pub fn of_time(time: NaiveTime) -> Phase {
        Self::ORDER
            .iter()
            .find(|(_, window)| window.contains(time))
            .map(|(phase, _)| *phase)
            .unwrap_or(Phase::Outside)
    }

    /// Classify a local timestamp
    pub fn at(now: &LocalTime) -> Phase {
        Self::of_time(now.time())
    }

    /// Clock window of this phase, if any
    pub fn window(&self) -> Option<TimeWindow> {
        Self::ORDER
            .iter()
            .find(|(phase, _)| phase == self)
            .map(|(_, window)| *window)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::MorningReport => "morning-report",
            Phase::Positioning => "positioning",
            Phase::Momentum => "momentum",
            Phase::Unwind => "unwind",
            Phase::Outside => "outside",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
