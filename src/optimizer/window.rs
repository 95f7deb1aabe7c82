use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};

/// A date window used by the scoring and simulation functions. All times
/// are UTC; date keys derived from it are `YYYY-MM-DD` (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Default window: `[now, next Sunday 23:59:59.999]` (spec §4.3).
    pub fn default_from(now: DateTime<Utc>) -> Self {
        let days_until_sunday = (7 - now.weekday().num_days_from_monday() as i64
            + Weekday::Sun.num_days_from_monday() as i64)
            % 7;
        let sunday_date = (now + Duration::days(days_until_sunday)).date_naive();
        let end = Utc
            .from_utc_datetime(&sunday_date.and_hms_milli_opt(23, 59, 59, 999).unwrap());
        Self { start: now, end }
    }

    pub fn contains(&self, when: DateTime<Utc>) -> bool {
        when >= self.start && when <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_ends_on_sunday() {
        let monday = Utc.with_ymd_and_hms(2026, 7, 27, 10, 0, 0).unwrap();
        let w = Window::default_from(monday);
        assert_eq!(w.end.weekday(), Weekday::Sun);
        assert!(w.end > monday);
    }

    #[test]
    fn default_window_on_sunday_stays_same_day() {
        let sunday = Utc.with_ymd_and_hms(2026, 8, 2, 10, 0, 0).unwrap();
        let w = Window::default_from(sunday);
        assert_eq!(w.end.weekday(), Weekday::Sun);
        assert_eq!(w.end.date_naive(), sunday.date_naive());
    }
}
