use chrono::{Duration, NaiveDate, TimeZone, Utc};

/// Percentage change between two adjacent fixed-length windows, rounded to
/// one decimal. A zero previous window yields 0 rather than a division by
/// zero, so the overview card never shows NaN or infinity.
pub fn growth_rate(last_window: u64, previous_window: u64) -> f64 {
    if previous_window == 0 {
        return 0.0;
    }
    let change =
        (last_window as f64 - previous_window as f64) / previous_window as f64 * 100.0;
    (change * 10.0).round() / 10.0
}

/// UTC millisecond bounds `[start, end)` of a single calendar day.
pub fn day_bounds_millis(day: NaiveDate) -> (i64, i64) {
    let start = Utc
        .from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap())
        .timestamp_millis();
    let end = Utc
        .from_utc_datetime(&(day + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap())
        .timestamp_millis();
    (start, end)
}

/// The trailing `n` calendar days ending with `today`, oldest first.
pub fn trailing_days(today: NaiveDate, n: i64) -> Vec<NaiveDate> {
    (0..n).rev().map(|i| today - Duration::days(i)).collect()
}

/// Chart label for a trend day, e.g. "Jan 05".
pub fn trend_label(day: NaiveDate) -> String {
    day.format("%b %d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_is_zero_when_previous_window_empty() {
        assert_eq!(growth_rate(0, 0), 0.0);
        assert_eq!(growth_rate(500, 0), 0.0);
    }

    #[test]
    fn growth_rounds_to_one_decimal() {
        assert_eq!(growth_rate(3, 2), 50.0);
        assert_eq!(growth_rate(1, 3), -66.7);
        assert_eq!(growth_rate(2, 3), -33.3);
        assert_eq!(growth_rate(7, 7), 0.0);
    }

    #[test]
    fn growth_is_finite() {
        assert!(growth_rate(u64::MAX, 1).is_finite());
    }

    #[test]
    fn trailing_days_are_oldest_first_and_complete() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let days = trailing_days(today, 7);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        assert_eq!(days[6], today);
        for pair in days.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
    }

    #[test]
    fn day_bounds_cover_exactly_one_day() {
        let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let (start, end) = day_bounds_millis(day);
        assert_eq!(end - start, 24 * 60 * 60 * 1000);
    }

    #[test]
    fn trend_label_format() {
        let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(trend_label(day), "Jan 05");
    }
}
