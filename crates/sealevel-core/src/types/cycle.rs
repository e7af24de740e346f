//! Repeat cycles: fixed 9-day windows advancing 7 days from a fixed epoch.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::constants::{
    CYCLE_EPOCH, CYCLE_STEP_DAYS, SCHEDULE_LAG_DAYS, WINDOW_DAYS_AFTER, WINDOW_DAYS_BEFORE,
};

/// Half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CycleWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// One unit of processing, identified by its center date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepeatCycle {
    pub center: NaiveDate,
}

impl RepeatCycle {
    pub fn new(center: NaiveDate) -> Self {
        Self { center }
    }

    /// The first cycle of the record, centered on 1992-10-05.
    pub fn first() -> Self {
        Self::new(CYCLE_EPOCH)
    }

    /// `[center - 5d, center + 4d)`.
    pub fn window(&self) -> CycleWindow {
        CycleWindow {
            start: self.center - Duration::days(WINDOW_DAYS_BEFORE),
            end: self.center + Duration::days(WINDOW_DAYS_AFTER),
        }
    }

    /// The cycle centered seven days later.
    pub fn next(&self) -> Self {
        Self::new(self.center + Duration::days(CYCLE_STEP_DAYS))
    }

    /// `YYYYMMDD`, as embedded in artifact file names.
    pub fn date_key(&self) -> String {
        self.center.format("%Y%m%d").to_string()
    }

    /// Center time as seconds since the Unix epoch.
    pub fn unix_seconds(&self) -> i64 {
        self.center.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
    }
}

/// Every cycle from the epoch whose center is strictly before
/// `last_reference_date - 5d`.
pub fn cycle_schedule(last_reference_date: NaiveDate) -> Vec<RepeatCycle> {
    let stop = last_reference_date - Duration::days(SCHEDULE_LAG_DAYS);
    let mut cycles = Vec::new();
    let mut cycle = RepeatCycle::first();
    while cycle.center < stop {
        cycles.push(cycle);
        cycle = cycle.next();
    }
    cycles
}

/// Year plus the elapsed fraction of that year at midnight of `date`.
pub fn decimal_year(date: NaiveDate) -> f64 {
    let year = date.year();
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let length = if leap { 366.0 } else { 365.0 };
    year as f64 + date.ordinal0() as f64 / length
}

/// Seconds from midnight of `epoch` to midnight of `date`.
pub fn seconds_since(date: NaiveDate, epoch: NaiveDate) -> f64 {
    ((date - epoch).num_days() * 86_400) as f64
}

/// Calendar date of a Unix timestamp in seconds.
pub fn date_from_unix_seconds(seconds: f64) -> Option<NaiveDate> {
    if !seconds.is_finite() {
        return None;
    }
    chrono::DateTime::from_timestamp(seconds.floor() as i64, 0)
        .map(|dt| dt.naive_utc().date())
}

/// Parse an 8-digit `YYYYMMDD` key.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    if key.len() != 8 || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{key}000000"), "%Y%m%d%H%M%S")
        .ok()
        .map(|dt| dt.date())
}
