use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Weekday};

use crate::error::{EnergyError, Result};

/// Output format used when a timestamp is written back out.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format used for bucket labels.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Date-time patterns tried in order after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a meter export timestamp into a zone-less date-time.
///
/// Values carrying a UTC offset (RFC 3339, `Z` suffix included) keep their
/// wall-clock reading and drop the offset; no conversion is applied.
/// A bare `%Y-%m-%d` date parses as midnight.
///
/// Day-first patterns are tried before month-first ones, so an ambiguous
/// `03/04/2024 10:00` reads as 3 April.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(EnergyError::TimestampParse(raw.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive);
        }
    }

    Err(EnergyError::TimestampParse(raw.to_string()))
}

// ── Week anchor ───────────────────────────────────────────────────────────────

/// Parse a weekday name (`"sun"`, `"Sunday"`, `"W-SUN"`) into a [`Weekday`].
pub fn parse_week_anchor(s: &str) -> Result<Weekday> {
    let lower = s.trim().to_lowercase();
    let name = lower.strip_prefix("w-").unwrap_or(&lower);
    name.parse::<Weekday>()
        .map_err(|_| EnergyError::Config(format!("unknown week anchor: {}", s)))
}

/// Three-letter lowercase name of `day`, the inverse of [`parse_week_anchor`].
pub fn week_anchor_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

// ── Granularity ───────────────────────────────────────────────────────────────

/// Fixed bucket width used by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One bucket per calendar day, labelled by that day.
    Daily,
    /// One bucket per week ending on `anchor`, labelled by the end date.
    Weekly { anchor: Weekday },
}

impl Granularity {
    /// Bucket label for a reading taken at `ts`, or `None` when the label
    /// falls past the last representable date.
    pub fn bucket_of(&self, ts: NaiveDateTime) -> Option<NaiveDate> {
        let day = ts.date();
        match self {
            Granularity::Daily => Some(day),
            Granularity::Weekly { anchor } => week_ending(day, *anchor),
        }
    }

    /// Label of the bucket immediately after `bucket`, or `None` at the end
    /// of the calendar.
    pub fn next_bucket(&self, bucket: NaiveDate) -> Option<NaiveDate> {
        let step = match self {
            Granularity::Daily => 1,
            Granularity::Weekly { .. } => 7,
        };
        bucket.checked_add_days(Days::new(step))
    }
}

/// The first date on or after `day` that falls on `anchor`.
///
/// `None` when that date cannot be represented.
pub fn week_ending(day: NaiveDate, anchor: Weekday) -> Option<NaiveDate> {
    let current = day.weekday().num_days_from_monday();
    let target = anchor.num_days_from_monday();
    let ahead = (target + 7 - current) % 7;
    day.checked_add_days(Days::new(u64::from(ahead)))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    // ── parse_timestamp ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_timestamp_space_separated() {
        let dt = parse_timestamp("2024-01-15 10:30:00").unwrap();
        assert_eq!(dt, date(2024, 1, 15).and_hms_opt(10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_without_seconds() {
        let dt = parse_timestamp("2024-01-15 10:30").unwrap();
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 0);
    }

    #[test]
    fn test_parse_timestamp_rfc3339_keeps_wall_clock() {
        let dt = parse_timestamp("2024-01-15T23:30:00+05:00").unwrap();
        assert_eq!(dt, date(2024, 1, 15).and_hms_opt(23, 30, 0).unwrap());

        let z = parse_timestamp("2024-01-15T10:00:00Z").unwrap();
        assert_eq!(z.hour(), 10);
    }

    #[test]
    fn test_parse_timestamp_date_only_is_midnight() {
        let dt = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(dt, at(2024, 3, 1, 0));
    }

    #[test]
    fn test_parse_timestamp_day_first_wins() {
        let dt = parse_timestamp("03/04/2024 10:00").unwrap();
        assert_eq!(dt.date(), date(2024, 4, 3));
    }

    #[test]
    fn test_parse_timestamp_month_first_fallback() {
        let dt = parse_timestamp("12/31/2024 08:15:00").unwrap();
        assert_eq!(dt.date(), date(2024, 12, 31));
    }

    #[test]
    fn test_parse_timestamp_trims_whitespace() {
        assert!(parse_timestamp("  2024-01-15 10:30:00 ").is_ok());
    }

    #[test]
    fn test_parse_timestamp_garbage_is_error() {
        let err = parse_timestamp("not-a-date").unwrap_err();
        assert_eq!(err.to_string(), "Invalid timestamp format: not-a-date");
        assert!(parse_timestamp("").is_err());
    }

    // ── week anchor ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_week_anchor_variants() {
        assert_eq!(parse_week_anchor("sun").unwrap(), Weekday::Sun);
        assert_eq!(parse_week_anchor("Monday").unwrap(), Weekday::Mon);
        assert_eq!(parse_week_anchor("W-SAT").unwrap(), Weekday::Sat);
        assert!(parse_week_anchor("someday").is_err());
    }

    #[test]
    fn test_week_anchor_name_round_trips() {
        for day in [Weekday::Mon, Weekday::Thu, Weekday::Sun] {
            assert_eq!(parse_week_anchor(week_anchor_name(day)).unwrap(), day);
        }
    }

    // ── week_ending ──────────────────────────────────────────────────────────

    #[test]
    fn test_week_ending_same_day_is_its_own_week() {
        // 2024-01-07 is a Sunday.
        assert_eq!(week_ending(date(2024, 1, 7), Weekday::Sun), Some(date(2024, 1, 7)));
    }

    #[test]
    fn test_week_ending_monday_rolls_forward() {
        // Monday 2024-01-08 belongs to the week ending Sunday 2024-01-14.
        assert_eq!(week_ending(date(2024, 1, 8), Weekday::Sun), Some(date(2024, 1, 14)));
    }

    #[test]
    fn test_week_ending_custom_anchor() {
        // Wednesday 2024-01-10 with weeks ending Friday → 2024-01-12.
        assert_eq!(week_ending(date(2024, 1, 10), Weekday::Fri), Some(date(2024, 1, 12)));
        // Saturday 2024-01-13 with weeks ending Friday → 2024-01-19.
        assert_eq!(week_ending(date(2024, 1, 13), Weekday::Fri), Some(date(2024, 1, 19)));
    }

    // ── Granularity ──────────────────────────────────────────────────────────

    #[test]
    fn test_daily_bucket_truncates_time() {
        let g = Granularity::Daily;
        assert_eq!(g.bucket_of(at(2024, 1, 15, 23)), Some(date(2024, 1, 15)));
        assert_eq!(g.next_bucket(date(2024, 1, 31)), Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_weekly_bucket_late_on_anchor_day() {
        let g = Granularity::Weekly {
            anchor: Weekday::Sun,
        };
        // Sunday 23:00 stays in the week that ends that Sunday.
        assert_eq!(g.bucket_of(at(2024, 1, 7, 23)), Some(date(2024, 1, 7)));
        assert_eq!(g.next_bucket(date(2024, 1, 7)), Some(date(2024, 1, 14)));
    }

    #[test]
    fn test_buckets_at_end_of_calendar() {
        let last = NaiveDate::MAX;
        let weekly = Granularity::Weekly {
            anchor: Weekday::Sun,
        };

        assert_eq!(Granularity::Daily.next_bucket(last), None);
        assert_eq!(weekly.next_bucket(last), None);
        assert_eq!(
            Granularity::Daily.bucket_of(last.and_hms_opt(0, 0, 0).unwrap()),
            Some(last)
        );
        // A week end beyond the calendar has no label.
        assert_eq!(week_ending(last, last.weekday().succ()), None);
        assert_eq!(week_ending(last, last.weekday()), Some(last));
    }
}
