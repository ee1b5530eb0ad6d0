//! Julian day numbers as stored in `$TDCREATE` / `$TDUPDATE`

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Julian day of 0001-01-01 (proleptic Gregorian) at midnight, minus one day.
const JULIAN_OFFSET: f64 = 1_721_424.5;

/// Convert a calendar timestamp into a Julian day number.
pub fn julian_date(date: NaiveDateTime) -> f64 {
    let days = date.date().num_days_from_ce() as f64 + JULIAN_OFFSET;
    let seconds = date.time().num_seconds_from_midnight() as f64;
    days + seconds / 86_400.0
}

/// Convert a Julian day number back to a calendar timestamp.
///
/// Returns `None` for values outside chrono's supported range.
pub fn calendar_date(juliandate: f64) -> Option<NaiveDateTime> {
    let shifted = juliandate - JULIAN_OFFSET;
    let days = shifted.floor();
    let seconds = ((shifted - days) * 86_400.0).round() as u32;
    let date = NaiveDate::from_num_days_from_ce_opt(days as i32)?;
    let (seconds, date) = if seconds >= 86_400 {
        (seconds - 86_400, date.succ_opt()?)
    } else {
        (seconds, date)
    };
    date.and_hms_opt(seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, ss)
            .unwrap()
    }

    #[test]
    fn test_known_epoch() {
        // 2000-01-01 12:00 is JD 2451545.0
        let jd = julian_date(timestamp(2000, 1, 1, 12, 0, 0));
        assert!((jd - 2_451_545.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverse() {
        let date = timestamp(2021, 7, 14, 8, 30, 15);
        assert_eq!(calendar_date(julian_date(date)), Some(date));
    }
}
