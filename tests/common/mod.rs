pub mod mock_source;

pub use mock_source::*;

use chrono::{DateTime, FixedOffset, TimeZone};
use zabbix_export::export::ClockFormatter;
use zabbix_export::models::{HistoryRecord, TimeWindow};
use zabbix_export::window::PeriodKind;

/// UTC+9, the default export offset
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

pub fn clock() -> ClockFormatter {
    ClockFormatter::new(jst())
}

/// 2024-03-15 12:00:00 +09:00
pub fn fixed_now() -> DateTime<FixedOffset> {
    jst().with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

/// Today's window (`20240315`) relative to [`fixed_now`]
pub fn today_window() -> TimeWindow {
    PeriodKind::Today.resolve(fixed_now()).unwrap()
}

/// Record `offset_secs` after the start of [`today_window`]
pub fn record(metric_id: &str, offset_secs: i64, value: &str) -> HistoryRecord {
    let start = today_window().start().timestamp();
    HistoryRecord {
        metric_id: metric_id.to_string(),
        clock: DateTime::from_timestamp(start + offset_secs, 0).unwrap(),
        value: value.to_string(),
        ns: 0,
    }
}

/// Data rows of a CSV file (header dropped), split into fields
pub fn read_rows(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|row| row.unwrap().iter().map(str::to_string).collect())
        .collect()
}
