//! Submission timestamps: UTC now plus a fixed, configured offset in whole
//! hours. No tz database; the offset is a deployment constant.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Calendar date + local clock time of a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stamp {
    local: NaiveDateTime,
}

impl Stamp {
    pub fn now(offset_hours: i32) -> Self {
        Self::from_utc(Utc::now(), offset_hours)
    }

    pub fn from_utc(utc: DateTime<Utc>, offset_hours: i32) -> Self {
        Self {
            local: utc.naive_utc() + Duration::hours(offset_hours as i64),
        }
    }

    /// Local calendar date, for the typed date cell.
    pub fn date(&self) -> NaiveDate {
        self.local.date()
    }

    /// Date as shown back to the user.
    pub fn date_display(&self) -> String {
        self.local.format("%d.%m.%Y").to_string()
    }

    /// Clock time written to the time column and shown to the user.
    pub fn time_display(&self) -> String {
        self.local.format("%H:%M").to_string()
    }

    /// Second-resolution timestamp used in blob object keys.
    pub fn key_timestamp(&self) -> String {
        self.local.format("%Y%m%d_%H%M%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn applies_positive_offset() {
        let s = Stamp::from_utc(utc(2026, 8, 6, 11, 30, 15), 3);
        assert_eq!(s.date_display(), "06.08.2026");
        assert_eq!(s.time_display(), "14:30");
        assert_eq!(s.key_timestamp(), "20260806_143015");
    }

    #[test]
    fn offset_can_roll_the_date_over() {
        let s = Stamp::from_utc(utc(2026, 12, 31, 23, 10, 0), 3);
        assert_eq!(s.date_display(), "01.01.2027");

        let back = Stamp::from_utc(utc(2026, 1, 1, 1, 0, 0), -3);
        assert_eq!(back.date_display(), "31.12.2025");
    }

    #[test]
    fn date_is_the_local_calendar_date() {
        let s = Stamp::from_utc(utc(2026, 8, 6, 22, 0, 0), 3);
        assert_eq!(s.date(), NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());
    }
}
