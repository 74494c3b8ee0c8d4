//! CSV serialization of one metric's history.

use std::path::Path;

use crate::error::TableError;
use crate::export::clock::ClockFormatter;
use crate::models::HistoryRecord;

pub const TABLE_HEADER: [&str; 4] = ["itemid", "clock", "value", "ns"];
pub const TABLE_EXTENSION: &str = "csv";

/// Render records, in the given order, as a CSV document with a header row
pub fn render_table(
    records: &[HistoryRecord],
    clock: &ClockFormatter,
) -> Result<Vec<u8>, TableError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::with_capacity(64 + records.len() * 48));

    writer.write_record(TABLE_HEADER)?;
    for record in records {
        let ns = record.ns.to_string();
        let clock = clock.render(record.clock);
        writer.write_record([
            record.metric_id.as_str(),
            clock.as_str(),
            record.value.as_str(),
            ns.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| TableError::Io(e.into_error()))
}

/// Render and write the table, replacing any existing file
pub async fn write_table(
    path: &Path,
    records: &[HistoryRecord],
    clock: &ClockFormatter,
) -> Result<(), TableError> {
    let bytes = render_table(records, clock)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn record(clock: i64, value: &str, ns: u32) -> HistoryRecord {
        HistoryRecord {
            metric_id: "23296".to_string(),
            clock: DateTime::from_timestamp(clock, 0).unwrap(),
            value: value.to_string(),
            ns,
        }
    }

    fn jst() -> ClockFormatter {
        ClockFormatter::new(FixedOffset::east_opt(9 * 3600).unwrap())
    }

    #[test]
    fn test_render_header_and_rows() {
        let bytes = render_table(
            &[record(0, "0.0155", 563157632), record(60, "0.0200", 0)],
            &jst(),
        )
        .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "itemid,clock,value,ns\r\n\
             23296,1970/01/01-09:00:00,0.0155,563157632\r\n\
             23296,1970/01/01-09:01:00,0.0200,0\r\n"
        );
    }

    #[test]
    fn test_render_empty_history_has_header_only() {
        let bytes = render_table(&[], &jst()).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "itemid,clock,value,ns\r\n");
    }

    #[tokio::test]
    async fn test_write_table_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cpu.csv");
        write_table(&path, &[record(0, "1", 0)], &jst()).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_write_table_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("cpu.csv");
        let result = write_table(&path, &[record(0, "1", 0)], &jst()).await;
        assert!(matches!(result, Err(TableError::Io(_))));
    }
}
