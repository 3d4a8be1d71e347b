//! # Calendar windows in epoch milliseconds
//!
//! Queries filter `dateAdded` with an inclusive [`DateRange`]. The helpers here
//! turn calendar notions (a `YYYY-MM-DD` day, the start of the current day,
//! week or month) into millisecond bounds in a given time zone. Callers pass
//! [`chrono::Local`] in the app and fixed offsets in tests.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};

use crate::error::StoreError;

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Inclusive `[start, end]` window in epoch milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: i64,
    end: i64,
}

impl DateRange {
    pub fn new(start: i64, end: i64) -> Result<Self, StoreError> {
        if start > end {
            return Err(StoreError::InvalidQuery(format!(
                "date range starts after it ends ({start} > {end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Window spanning two instants.
    pub fn between<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> Result<Self, StoreError> {
        Self::new(start.timestamp_millis(), end.timestamp_millis())
    }

    /// `00:00:00.000` to `23:59:59.999` of `date` in `tz`.
    pub fn day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<Self, StoreError> {
        let start = midnight(date, tz)?;
        let last = date
            .and_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| StoreError::InvalidDate(date.to_string()))?;
        let end = resolve_local(tz, &last, true)?;
        Self::new(start.timestamp_millis(), end.timestamp_millis())
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn contains(&self, millis: i64) -> bool {
        (self.start..=self.end).contains(&millis)
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_calendar_date(date: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| StoreError::InvalidDate(format!("{date}: {e}")))
}

/// Midnight at the start of `now`'s calendar day.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> Result<DateTime<Tz>, StoreError> {
    midnight(now.date_naive(), &now.timezone())
}

/// Midnight at the start of the calendar week containing `now`.
pub fn start_of_week<Tz: TimeZone>(
    now: &DateTime<Tz>,
    week_start: Weekday,
) -> Result<DateTime<Tz>, StoreError> {
    let date = now.date_naive();
    let back = (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    let first = date
        .checked_sub_days(Days::new(u64::from(back)))
        .ok_or_else(|| StoreError::InvalidDate(date.to_string()))?;
    midnight(first, &now.timezone())
}

/// Midnight on the first day of `now`'s calendar month.
pub fn start_of_month<Tz: TimeZone>(now: &DateTime<Tz>) -> Result<DateTime<Tz>, StoreError> {
    let date = now.date_naive();
    let first = date
        .with_day(1)
        .ok_or_else(|| StoreError::InvalidDate(date.to_string()))?;
    midnight(first, &now.timezone())
}

fn midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Tz>, StoreError> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| StoreError::InvalidDate(date.to_string()))?;
    resolve_local(tz, &naive, false)
}

// Zones that skip midnight on a DST switch start the day at the first valid
// local time after the gap.
fn resolve_local<Tz: TimeZone>(
    tz: &Tz,
    naive: &NaiveDateTime,
    latest: bool,
) -> Result<DateTime<Tz>, StoreError> {
    let resolved = tz.from_local_datetime(naive);
    let picked = if latest {
        resolved.latest()
    } else {
        resolved.earliest()
    };
    if let Some(dt) = picked {
        return Ok(dt);
    }
    let shifted = *naive + chrono::Duration::hours(if latest { -1 } else { 1 });
    tz.from_local_datetime(&shifted)
        .earliest()
        .ok_or_else(|| StoreError::InvalidDate(naive.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn sast() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    #[test]
    fn test_day_bounds() {
        let date = parse_calendar_date("2024-03-05").unwrap();
        let range = DateRange::day(date, &Utc).unwrap();

        let start = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(range.start(), start.timestamp_millis());
        assert_eq!(range.end(), start.timestamp_millis() + 86_400_000 - 1);
    }

    #[test]
    fn test_day_bounds_follow_the_zone() {
        let date = parse_calendar_date("2024-03-05").unwrap();
        let utc = DateRange::day(date, &Utc).unwrap();
        let local = DateRange::day(date, &sast()).unwrap();
        assert_eq!(utc.start() - local.start(), 2 * 3_600_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_calendar_date("05/03/2024"),
            Err(StoreError::InvalidDate(_))
        ));
        assert!(parse_calendar_date("2024-02-30").is_err());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        assert!(DateRange::new(10, 5).is_err());
        let range = DateRange::new(5, 5).unwrap();
        assert!(range.contains(5));
        assert!(!range.contains(6));
    }

    #[test]
    fn test_start_of_week_and_month() {
        // Wednesday 2024-03-20 15:30 +02:00
        let now = sast().with_ymd_and_hms(2024, 3, 20, 15, 30, 0).unwrap();

        let monday = start_of_week(&now, Weekday::Mon).unwrap();
        assert_eq!(monday, sast().with_ymd_and_hms(2024, 3, 18, 0, 0, 0).unwrap());

        let sunday = start_of_week(&now, Weekday::Sun).unwrap();
        assert_eq!(sunday, sast().with_ymd_and_hms(2024, 3, 17, 0, 0, 0).unwrap());

        let month = start_of_month(&now).unwrap();
        assert_eq!(month, sast().with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());

        let today = start_of_day(&now).unwrap();
        assert_eq!(today, sast().with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_start_of_week_on_the_first_day() {
        let sunday = Utc.with_ymd_and_hms(2024, 3, 17, 8, 0, 0).unwrap();
        let start = start_of_week(&sunday, Weekday::Sun).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 17, 0, 0, 0).unwrap());
    }
}
