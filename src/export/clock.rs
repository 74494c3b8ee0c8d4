//! Rendering of sample timestamps for the `clock` column.

use chrono::{DateTime, FixedOffset, Utc};

/// `2024/03/15-09:00:00`
pub const CLOCK_FORMAT: &str = "%Y/%m/%d-%H:%M:%S";

/// Renders absolute instants in a fixed UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockFormatter {
    offset: FixedOffset,
}

impl ClockFormatter {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn render(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format(CLOCK_FORMAT)
            .to_string()
    }

    /// Current time in the formatter's offset
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn jst() -> ClockFormatter {
        ClockFormatter::new(FixedOffset::east_opt(9 * 3600).unwrap())
    }

    #[test]
    fn test_unix_epoch_renders_in_jst() {
        let epoch = DateTime::from_timestamp(0, 0).unwrap();
        assert_eq!(jst().render(epoch), "1970/01/01-09:00:00");
    }

    #[test]
    fn test_render_crosses_date_line() {
        // 2024-03-14 15:00:00 UTC is midnight in JST
        let instant = DateTime::from_timestamp(1_710_428_400, 0).unwrap();
        assert_eq!(jst().render(instant), "2024/03/15-00:00:00");

        let utc = ClockFormatter::new(FixedOffset::east_opt(0).unwrap());
        assert_eq!(utc.render(instant), "2024/03/14-15:00:00");
    }

    proptest! {
        #[test]
        fn prop_rendering_preserves_order(a in 0i64..4_102_444_800, b in 0i64..4_102_444_800) {
            let formatter = jst();
            let ra = formatter.render(DateTime::from_timestamp(a, 0).unwrap());
            let rb = formatter.render(DateTime::from_timestamp(b, 0).unwrap());
            // fixed-width, zero-padded, so lexical order matches time order
            prop_assert_eq!(ra.len(), 19);
            prop_assert_eq!(a.cmp(&b), ra.cmp(&rb));
        }
    }
}
