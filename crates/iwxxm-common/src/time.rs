//! Time fix-ups for TAC timestamps.
//!
//! TAC groups carry day-of-month and hour/minute only; the year and month
//! must be recovered relative to a reference clock supplied by the caller.
//! All operations here are pure functions of that clock, so decodes are
//! reproducible under test.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

/// ISO 8601 instant with trailing Z, the timestamp format used throughout
/// IWXXM documents.
pub fn iso_format(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Resolve a (day, hour, minute) report timestamp against `now`, choosing
/// the month (previous, current or next) that puts the instant nearest the
/// reference clock. Days that do not exist in a candidate month (the 31st
/// in February) are skipped. Returns None for an impossible timestamp.
pub fn nearest_time(now: DateTime<Utc>, day: u32, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    if day == 0 || day > 31 || hour > 24 || minute > 59 {
        return None;
    }
    // Hour 24 is legal in trend groups and means 00Z of the following day.
    let (hour, day_carry) = if hour == 24 { (0, 1) } else { (hour, 0) };

    let mut best: Option<DateTime<Utc>> = None;
    for month_offset in [-1i32, 0, 1] {
        let mut year = now.year();
        let mut month = now.month() as i32 + month_offset;
        if month < 1 {
            month += 12;
            year -= 1;
        } else if month > 12 {
            month -= 12;
            year += 1;
        }
        let Some(candidate) = Utc
            .with_ymd_and_hms(year, month as u32, day, hour, minute, 0)
            .single()
        else {
            continue;
        };
        let candidate = candidate + Duration::days(day_carry);
        let keep = match best {
            None => true,
            Some(b) => (candidate - now).num_seconds().abs() < (b - now).num_seconds().abs(),
        };
        if keep {
            best = Some(candidate);
        }
    }
    best
}

/// Resolve a (day, hour) group boundary within a forecast period: the
/// result is the first instant with that day/hour at or after `base`,
/// rolling into the next month when the day has already passed. Used for
/// TAF change-group windows.
pub fn on_or_after(base: DateTime<Utc>, day: u32, hour: u32) -> Option<DateTime<Utc>> {
    if day == 0 || day > 31 || hour > 24 {
        return None;
    }
    let (hour, day_carry) = if hour == 24 { (0, 1) } else { (hour, 0) };

    for month_offset in [0u32, 1, 2] {
        let mut year = base.year();
        let mut month = base.month() + month_offset;
        if month > 12 {
            month -= 12;
            year += 1;
        }
        if let Some(t) = Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).single() {
            let t = t + Duration::days(day_carry);
            if t >= base {
                return Some(t);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_nearest_time_same_month() {
        let now = clock(2024, 3, 15, 12);
        let t = nearest_time(now, 15, 11, 51).unwrap();
        assert_eq!(iso_format(t), "2024-03-15T11:51:00Z");
    }

    #[test]
    fn test_nearest_time_previous_month() {
        // Report from the 31st read on the 1st: must resolve to last month.
        let now = clock(2024, 4, 1, 0);
        let t = nearest_time(now, 31, 23, 55).unwrap();
        assert_eq!(iso_format(t), "2024-03-31T23:55:00Z");
    }

    #[test]
    fn test_nearest_time_year_boundary() {
        let now = clock(2024, 1, 1, 0);
        let t = nearest_time(now, 31, 23, 0).unwrap();
        assert_eq!(iso_format(t), "2023-12-31T23:00:00Z");
    }

    #[test]
    fn test_nearest_time_hour_24() {
        let now = clock(2024, 3, 15, 22);
        let t = nearest_time(now, 15, 24, 0).unwrap();
        assert_eq!(iso_format(t), "2024-03-16T00:00:00Z");
    }

    #[test]
    fn test_on_or_after_rolls_month() {
        let base = clock(2024, 3, 30, 12);
        let t = on_or_after(base, 1, 6).unwrap();
        assert_eq!(iso_format(t), "2024-04-01T06:00:00Z");
    }

    #[test]
    fn test_on_or_after_same_day() {
        let base = clock(2024, 3, 15, 6);
        let t = on_or_after(base, 15, 18).unwrap();
        assert_eq!(iso_format(t), "2024-03-15T18:00:00Z");
    }
}
