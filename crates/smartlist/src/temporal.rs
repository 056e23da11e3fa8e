//! Relative date periods and their resolution to concrete ranges.
//!
//! ## Supported tokens
//!
//! - `today`
//! - `lastNhours`, `lastNdays`, `lastNweeks`, `lastNmonths`
//! - `thisweek`, `thismonth`, `thisyear`
//! - `pastweek`, `pastmonth`, `pastyear` (trailing 7 / 30 / 365 days)
//!
//! Every period resolves to the half-open range `[start, now)`. Calendar
//! boundaries (day, week, month, year) are taken in the caller's
//! [`CalendarConfig`] offset, and weeks begin on its configured weekday.

use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, TimeZone, Utc, Weekday,
};
use serde::{Deserialize, Serialize};

use crate::config::CalendarConfig;
use crate::error::{EngineError, Result};

/// A symbolic time window relative to an evaluation instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "period", content = "count", rename_all = "camelCase")]
pub enum RelativePeriod {
    Today,
    LastHours(u32),
    LastDays(u32),
    LastWeeks(u32),
    LastMonths(u32),
    ThisWeek,
    ThisMonth,
    ThisYear,
}

/// A resolved half-open range `[start, end)`; `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a range, collapsing an inverted pair to an empty range at `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: start.min(end),
            end,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl RelativePeriod {
    /// Resolves the period against `now`. See [`resolve_period`].
    pub fn resolve(self, now: DateTime<Utc>, calendar: &CalendarConfig) -> DateRange {
        resolve_period(self, now, calendar)
    }
}

/// Resolves a relative period to `[start, now)`.
///
/// Deterministic for a fixed `now` and calendar.
pub fn resolve_period(
    period: RelativePeriod,
    now: DateTime<Utc>,
    calendar: &CalendarConfig,
) -> DateRange {
    let offset = calendar.offset();
    let today = now.with_timezone(&offset).date_naive();

    let start = match period {
        RelativePeriod::Today => local_midnight(today, offset),
        RelativePeriod::LastHours(hours) => {
            now.checked_sub_signed(Duration::hours(i64::from(hours)))
        }
        RelativePeriod::LastDays(days) => trailing_days(now, i64::from(days)),
        RelativePeriod::LastWeeks(weeks) => trailing_days(now, i64::from(weeks) * 7),
        RelativePeriod::LastMonths(months) => now
            .with_timezone(&offset)
            .checked_sub_months(Months::new(months))
            .map(|local| local.with_timezone(&Utc)),
        RelativePeriod::ThisWeek => {
            let days_since_start = days_since_week_start(today.weekday(), calendar.week_start());
            today
                .checked_sub_signed(Duration::days(days_since_start))
                .and_then(|date| local_midnight(date, offset))
        }
        RelativePeriod::ThisMonth => today
            .with_day(1)
            .and_then(|date| local_midnight(date, offset)),
        RelativePeriod::ThisYear => NaiveDate::from_ymd_opt(today.year(), 1, 1)
            .and_then(|date| local_midnight(date, offset)),
    };

    DateRange::new(start.unwrap_or(DateTime::<Utc>::MIN_UTC), now)
}

/// Returns the trailing `[now - days, now)` window.
///
/// Unlike calendar periods this needs no [`CalendarConfig`].
pub fn trailing_window(now: DateTime<Utc>, days: u32) -> DateRange {
    let start = trailing_days(now, i64::from(days)).unwrap_or(DateTime::<Utc>::MIN_UTC);
    DateRange::new(start, now)
}

/// Returns the local calendar day containing `instant` as `[midnight, next midnight)`.
pub fn day_range(instant: DateTime<Utc>, calendar: &CalendarConfig) -> DateRange {
    let offset = calendar.offset();
    let date = instant.with_timezone(&offset).date_naive();
    calendar_day_range(date, calendar)
}

/// Returns a calendar date in the caller's offset as `[midnight, next midnight)`.
pub fn calendar_day_range(date: NaiveDate, calendar: &CalendarConfig) -> DateRange {
    let offset = calendar.offset();
    let start = local_midnight(date, offset).unwrap_or(DateTime::<Utc>::MIN_UTC);
    let end = date
        .succ_opt()
        .and_then(|next| local_midnight(next, offset))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    DateRange::new(start, end)
}

fn days_since_week_start(today: Weekday, week_start: Weekday) -> i64 {
    let today = i64::from(today.num_days_from_monday());
    let start = i64::from(week_start.num_days_from_monday());
    (today - start).rem_euclid(7)
}

fn trailing_days(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|span| now.checked_sub_signed(span))
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

impl FromStr for RelativePeriod {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self> {
        let token = raw
            .chars()
            .filter(|ch| !matches!(ch, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match token.as_str() {
            "today" => return Ok(Self::Today),
            "thisweek" => return Ok(Self::ThisWeek),
            "thismonth" => return Ok(Self::ThisMonth),
            "thisyear" => return Ok(Self::ThisYear),
            "pastweek" => return Ok(Self::LastDays(7)),
            "pastmonth" => return Ok(Self::LastDays(30)),
            "pastyear" => return Ok(Self::LastDays(365)),
            _ => {}
        }

        let invalid = || EngineError::InvalidPeriod(raw.trim().to_string());
        let rest = token.strip_prefix("last").ok_or_else(invalid)?;
        let digits = rest
            .find(|ch: char| !ch.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (count, unit) = rest.split_at(digits);
        let count = count.parse::<u32>().map_err(|_| invalid())?;

        match unit {
            "hour" | "hours" | "h" => Ok(Self::LastHours(count)),
            "day" | "days" | "d" => Ok(Self::LastDays(count)),
            "week" | "weeks" | "w" => Ok(Self::LastWeeks(count)),
            "month" | "months" | "m" => Ok(Self::LastMonths(count)),
            _ => Err(invalid()),
        }
    }
}

/// Parses an absolute calendar date from various formats.
///
/// - `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY.MM.DD`
/// - `DD-MM-YYYY`, `MM-DD-YYYY` (and the `/` and `.` variants)
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let sep = trimmed.chars().find(|ch| matches!(ch, '-' | '/' | '.'))?;
    let year_first = trimmed
        .get(..4)
        .is_some_and(|prefix| prefix.chars().all(|c| c.is_ascii_digit()));

    let formats: &[&str] = match (sep, year_first) {
        ('-', true) => &["%Y-%m-%d"],
        ('-', false) => &["%d-%m-%Y", "%m-%d-%Y"],
        ('/', true) => &["%Y/%m/%d"],
        ('/', false) => &["%m/%d/%Y", "%d/%m/%Y"],
        ('.', true) => &["%Y.%m.%d"],
        ('.', false) => &["%d.%m.%Y", "%m.%d.%Y"],
        _ => &[],
    };

    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    fn monday_utc() -> CalendarConfig {
        CalendarConfig::utc(Weekday::Mon)
    }

    #[test]
    fn last_days_is_a_trailing_window() {
        let now = at(2025, 1, 15, 0);
        let range = resolve_period(RelativePeriod::LastDays(7), now, &monday_utc());
        assert_eq!(range.start(), at(2025, 1, 8, 0));
        assert_eq!(range.end(), now);
        assert!(range.contains(at(2025, 1, 10, 0)));
        assert!(!range.contains(at(2025, 1, 1, 0)));
        assert!(!range.contains(now), "end bound is exclusive");
    }

    #[test]
    fn today_starts_at_local_midnight() {
        let now = at(2025, 3, 10, 2);
        let utc = resolve_period(RelativePeriod::Today, now, &monday_utc());
        assert_eq!(utc.start(), at(2025, 3, 10, 0));

        // 02:00 UTC is still 21:00 on the 9th at UTC-5.
        let eastern = CalendarConfig::new(Weekday::Mon, -300).unwrap();
        let local = resolve_period(RelativePeriod::Today, now, &eastern);
        assert_eq!(local.start(), at(2025, 3, 9, 5));
    }

    #[test]
    fn this_week_follows_configured_week_start() {
        // 2025-01-15 is a Wednesday.
        let now = at(2025, 1, 15, 12);
        let monday = resolve_period(RelativePeriod::ThisWeek, now, &monday_utc());
        assert_eq!(monday.start(), at(2025, 1, 13, 0));

        let sunday = resolve_period(
            RelativePeriod::ThisWeek,
            now,
            &CalendarConfig::utc(Weekday::Sun),
        );
        assert_eq!(sunday.start(), at(2025, 1, 12, 0));

        let saturday = resolve_period(
            RelativePeriod::ThisWeek,
            now,
            &CalendarConfig::utc(Weekday::Sat),
        );
        assert_eq!(saturday.start(), at(2025, 1, 11, 0));
    }

    #[test]
    fn week_start_on_the_same_day_is_today() {
        // 2025-01-13 is a Monday.
        let now = at(2025, 1, 13, 9);
        let range = resolve_period(RelativePeriod::ThisWeek, now, &monday_utc());
        assert_eq!(range.start(), at(2025, 1, 13, 0));
    }

    #[test]
    fn this_month_and_year() {
        let now = at(2024, 2, 29, 18);
        let month = resolve_period(RelativePeriod::ThisMonth, now, &monday_utc());
        assert_eq!(month.start(), at(2024, 2, 1, 0));
        let year = resolve_period(RelativePeriod::ThisYear, now, &monday_utc());
        assert_eq!(year.start(), at(2024, 1, 1, 0));
    }

    #[test]
    fn last_months_clamps_to_month_end() {
        let now = at(2024, 3, 31, 0);
        let range = resolve_period(RelativePeriod::LastMonths(1), now, &monday_utc());
        assert_eq!(range.start(), at(2024, 2, 29, 0));
    }

    #[test]
    fn zero_length_window_is_empty() {
        let now = at(2025, 1, 15, 0);
        let range = resolve_period(RelativePeriod::LastDays(0), now, &monday_utc());
        assert!(range.is_empty());
        assert!(range.start() <= range.end());
    }

    #[test]
    fn resolution_is_deterministic() {
        let now = at(2025, 6, 1, 7);
        let calendar = CalendarConfig::new(Weekday::Sun, 330).unwrap();
        for period in [
            RelativePeriod::Today,
            RelativePeriod::ThisWeek,
            RelativePeriod::ThisMonth,
            RelativePeriod::LastWeeks(2),
        ] {
            assert_eq!(
                resolve_period(period, now, &calendar),
                resolve_period(period, now, &calendar)
            );
        }
    }

    #[test]
    fn parses_period_tokens() {
        assert_eq!("last7Days".parse::<RelativePeriod>().unwrap(), RelativePeriod::LastDays(7));
        assert_eq!("last_24_hours".parse::<RelativePeriod>().unwrap(), RelativePeriod::LastHours(24));
        assert_eq!("this week".parse::<RelativePeriod>().unwrap(), RelativePeriod::ThisWeek);
        assert_eq!("pastmonth".parse::<RelativePeriod>().unwrap(), RelativePeriod::LastDays(30));
        assert_eq!("last3months".parse::<RelativePeriod>().unwrap(), RelativePeriod::LastMonths(3));
        assert!("lastfortnight".parse::<RelativePeriod>().is_err());
        assert!("someday".parse::<RelativePeriod>().is_err());
        assert!("last7".parse::<RelativePeriod>().is_err());
    }

    #[test]
    fn period_serializes_with_count() {
        let json = serde_json::to_value(RelativePeriod::LastDays(7)).unwrap();
        assert_eq!(json, serde_json::json!({ "period": "lastDays", "count": 7 }));
        let today: RelativePeriod = serde_json::from_str(r#"{"period":"today"}"#).unwrap();
        assert_eq!(today, RelativePeriod::Today);
    }

    #[test]
    fn calendar_dates_in_several_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 15);
        assert_eq!(parse_calendar_date("2024-06-15"), expected);
        assert_eq!(parse_calendar_date("2024/06/15"), expected);
        assert_eq!(parse_calendar_date("15.06.2024"), expected);
        assert_eq!(parse_calendar_date("06/15/2024"), expected);
        assert_eq!(parse_calendar_date("notadate"), None);
    }

    #[test]
    fn day_range_uses_offset() {
        let calendar = CalendarConfig::new(Weekday::Mon, 60).unwrap();
        let range = day_range(at(2025, 1, 10, 23), &calendar);
        // 23:00 UTC is already 00:00 on the 11th at UTC+1.
        assert_eq!(range.start(), at(2025, 1, 10, 23));
        assert_eq!(range.end(), at(2025, 1, 11, 23));
    }
}
