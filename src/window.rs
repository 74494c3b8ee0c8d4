//! Time-window resolution for the four supported export periods.
//!
//! Boundaries are computed in the configured fixed offset, the same offset the
//! exported `clock` column is rendered in, so "today" means today on the
//! monitoring team's wall clock regardless of where the exporter runs.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::TimeWindow;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("unknown period '{0}' (expected td, ld, tm or lm)")]
    UnknownPeriod(String),

    #[error("period boundary out of range for {0}")]
    OutOfRange(NaiveDate),
}

/// Export period requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodKind {
    #[default]
    Today,
    Yesterday,
    ThisMonth,
    LastMonth,
}

impl FromStr for PeriodKind {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "td" | "today" => Ok(PeriodKind::Today),
            "ld" | "yesterday" => Ok(PeriodKind::Yesterday),
            "tm" | "this-month" => Ok(PeriodKind::ThisMonth),
            "lm" | "last-month" => Ok(PeriodKind::LastMonth),
            _ => Err(WindowError::UnknownPeriod(s.to_string())),
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PeriodKind::Today => "today",
            PeriodKind::Yesterday => "yesterday",
            PeriodKind::ThisMonth => "this-month",
            PeriodKind::LastMonth => "last-month",
        };
        f.write_str(name)
    }
}

impl PeriodKind {
    /// Resolve the window relative to `now`, using `now`'s offset for day and
    /// month boundaries
    pub fn resolve(self, now: DateTime<FixedOffset>) -> Result<TimeWindow, WindowError> {
        let offset = *now.offset();
        let today = now.date_naive();

        match self {
            PeriodKind::Today => day_window(today, offset),
            PeriodKind::Yesterday => {
                let yesterday = today.pred_opt().ok_or(WindowError::OutOfRange(today))?;
                day_window(yesterday, offset)
            }
            PeriodKind::ThisMonth => month_window(first_of_month(today)?, offset),
            PeriodKind::LastMonth => {
                let first = first_of_month(today)?;
                let last_of_previous = first.pred_opt().ok_or(WindowError::OutOfRange(first))?;
                month_window(first_of_month(last_of_previous)?, offset)
            }
        }
    }
}

fn first_of_month(date: NaiveDate) -> Result<NaiveDate, WindowError> {
    date.with_day(1).ok_or(WindowError::OutOfRange(date))
}

fn midnight(date: NaiveDate, offset: FixedOffset) -> Result<DateTime<Utc>, WindowError> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or(WindowError::OutOfRange(date))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or(WindowError::OutOfRange(date))
}

/// `[first 00:00:00, next_first 00:00:00 - 1s]` in `offset`
fn span(
    first: NaiveDate,
    next_first: NaiveDate,
    offset: FixedOffset,
    label: String,
) -> Result<TimeWindow, WindowError> {
    let start = midnight(first, offset)?;
    let end = midnight(next_first, offset)? - Duration::seconds(1);
    TimeWindow::new(start, end, label).ok_or(WindowError::OutOfRange(first))
}

fn day_window(day: NaiveDate, offset: FixedOffset) -> Result<TimeWindow, WindowError> {
    let next = day.succ_opt().ok_or(WindowError::OutOfRange(day))?;
    span(day, next, offset, day.format("%Y%m%d").to_string())
}

fn month_window(first: NaiveDate, offset: FixedOffset) -> Result<TimeWindow, WindowError> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    let next = NaiveDate::from_ymd_opt(year, month, 1).ok_or(WindowError::OutOfRange(first))?;
    span(first, next, offset, first.format("%Y%m").to_string())
}
