//! Calendar-day storage keys and duration formatting.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Storage key for the UTC calendar day containing `at`, e.g. `2026-03-02`.
pub fn day_key(at: DateTime<Utc>) -> String {
    at.format(DAY_KEY_FORMAT).to_string()
}

/// Parses a strict `YYYY-MM-DD` key into a date.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    if key.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(key, DAY_KEY_FORMAT).ok()
}

/// Formats whole seconds as `1h 5m`, `3m 20s` or `45s`.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Human label for a day relative to `today`.
pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        return "Today".to_string();
    }
    if today.pred_opt() == Some(day) {
        return "Yesterday".to_string();
    }
    if day.year() == today.year() {
        day.format("%b %-d").to_string()
    } else {
        day.format("%b %-d, %Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_key_uses_utc_date() {
        let late = Utc.with_ymd_and_hms(2026, 3, 2, 23, 59, 59).unwrap();
        assert_eq!(day_key(late), "2026-03-02");
        let early = Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap();
        assert_eq!(day_key(early), "2026-03-03");
    }

    #[test]
    fn parse_day_key_is_strict() {
        assert_eq!(parse_day_key("2026-03-02"), Some(date(2026, 3, 2)));
        assert_eq!(parse_day_key("2026-3-2"), None);
        assert_eq!(parse_day_key("2026-02-30"), None);
        assert_eq!(parse_day_key("theme"), None);
        assert_eq!(parse_day_key("2026-03-02T00"), None);
    }

    #[test]
    fn format_duration_picks_two_largest_units() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(200), "3m 20s");
        assert_eq!(format_duration(3_900), "1h 5m");
        assert_eq!(format_duration(3_600), "1h 0m");
    }

    #[test]
    fn day_label_relative_to_today() {
        let today = date(2026, 3, 2);
        assert_eq!(day_label(today, today), "Today");
        assert_eq!(day_label(date(2026, 3, 1), today), "Yesterday");
        assert_eq!(day_label(date(2026, 1, 15), today), "Jan 15");
        assert_eq!(day_label(date(2025, 12, 31), today), "Dec 31, 2025");
    }
}
