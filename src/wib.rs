//! Date and time as observed in WIB (UTC+7).
//!
//! Every cutoff comparison in the service goes through this module, so the
//! host timezone never leaks into "today" or "now".

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
    Weekday,
};
use once_cell::sync::Lazy;

pub const WIB_OFFSET_SECS: i32 = 7 * 3600;

static WIB: Lazy<FixedOffset> =
    Lazy::new(|| FixedOffset::east_opt(WIB_OFFSET_SECS).expect("UTC+7 is a valid offset"));

const DAY_NAMES: [(Weekday, &str); 7] = [
    (Weekday::Mon, "Senin"),
    (Weekday::Tue, "Selasa"),
    (Weekday::Wed, "Rabu"),
    (Weekday::Thu, "Kamis"),
    (Weekday::Fri, "Jumat"),
    (Weekday::Sat, "Sabtu"),
    (Weekday::Sun, "Minggu"),
];

/// Source of "now". Handlers and jobs never call `Utc::now()` directly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Builds a clock from a WIB wall-clock reading.
    pub fn at_wib(date: NaiveDate, time: NaiveTime) -> Self {
        Self(from_wib(date.and_time(time)))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn offset() -> FixedOffset {
    *WIB
}

pub fn to_wib(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&offset())
}

/// Interprets a naive timestamp as WIB wall-clock time.
pub fn from_wib(local: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(local - chrono::Duration::seconds(i64::from(WIB_OFFSET_SECS))))
}

pub fn now_wib(clock: &dyn Clock) -> DateTime<FixedOffset> {
    to_wib(clock.now())
}

pub fn today(instant: DateTime<Utc>) -> NaiveDate {
    to_wib(instant).date_naive()
}

/// Wall-clock time in WIB, truncated to the minute.
pub fn current_time(instant: DateTime<Utc>) -> NaiveTime {
    let local = to_wib(instant);
    NaiveTime::from_hms_opt(local.hour(), local.minute(), 0).unwrap_or(NaiveTime::MIN)
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn weekday_name(day: Weekday) -> &'static str {
    DAY_NAMES
        .iter()
        .find(|(d, _)| *d == day)
        .map(|(_, name)| *name)
        .unwrap_or("Senin")
}

pub fn day_name_of(date: NaiveDate) -> &'static str {
    weekday_name(date.weekday())
}

/// Accepts Indonesian day names case-insensitively, plus the "Jum'at" spelling.
pub fn parse_day_name(name: &str) -> Option<Weekday> {
    let normalized = name.trim().replace('\'', "").to_lowercase();
    DAY_NAMES
        .iter()
        .find(|(_, n)| n.to_lowercase() == normalized)
        .map(|(d, _)| *d)
}

/// Calendar date in WIB for a `YYYY-MM-DD`, RFC 3339 or naive ISO timestamp.
pub fn date_from_iso(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }
    datetime_from_iso(input).map(|dt| dt.date_naive())
}

/// WIB wall-clock time (minute precision) for an ISO timestamp.
pub fn time_from_iso(input: &str) -> Option<NaiveTime> {
    datetime_from_iso(input.trim()).map(|dt| current_time(dt.with_timezone(&Utc)))
}

fn datetime_from_iso(input: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&offset()));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|naive| to_wib(from_wib(naive)))
}

/// Parses settings times stored as `HH:MM:SS` or `HH:MM`.
pub fn parse_clock(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .ok()
}

/// Whole minutes from `now` until `target` on the same day. Negative once passed.
pub fn minutes_until(now: NaiveTime, target: NaiveTime) -> i64 {
    target.signed_duration_since(now).num_minutes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn today_rolls_over_at_wib_midnight() {
        // 17:00 UTC is already the next day in WIB.
        assert_eq!(
            today(utc("2025-01-05T17:00:00Z")),
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
        );
        assert_eq!(
            today(utc("2025-01-05T16:59:00Z")),
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()
        );
    }

    #[test]
    fn current_time_is_truncated_to_minutes() {
        let t = current_time(utc("2025-01-06T07:05:42Z"));
        assert_eq!(t, NaiveTime::from_hms_opt(14, 5, 0).unwrap());
        assert_eq!(format_hhmm(t), "14:05");
    }

    #[test]
    fn day_names_are_indonesian() {
        assert_eq!(weekday_name(Weekday::Mon), "Senin");
        assert_eq!(weekday_name(Weekday::Fri), "Jumat");
        assert_eq!(day_name_of(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()), "Jumat");
        assert_eq!(parse_day_name("jum'at"), Some(Weekday::Fri));
        assert_eq!(parse_day_name(" MINGGU "), Some(Weekday::Sun));
        assert_eq!(parse_day_name("Monday"), None);
    }

    #[test]
    fn iso_inputs_resolve_in_wib() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(date_from_iso("2025-01-06"), Some(d));
        assert_eq!(date_from_iso("2025-01-05T18:30:00Z"), Some(d));
        assert_eq!(date_from_iso("2025-01-06T08:00:00"), Some(d));
        assert_eq!(
            time_from_iso("2025-01-06T00:20:00Z"),
            NaiveTime::from_hms_opt(7, 20, 0)
        );
        assert_eq!(date_from_iso("not a date"), None);
    }

    #[test]
    fn clock_strings_accept_both_precisions() {
        assert_eq!(parse_clock("07:30:00"), NaiveTime::from_hms_opt(7, 30, 0));
        assert_eq!(parse_clock("14:00"), NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(parse_clock("25:00"), None);
    }

    #[test]
    fn minutes_until_is_signed() {
        let late = NaiveTime::from_hms_opt(7, 30, 0).unwrap();
        assert_eq!(minutes_until(NaiveTime::from_hms_opt(7, 20, 0).unwrap(), late), 10);
        assert_eq!(minutes_until(NaiveTime::from_hms_opt(7, 40, 0).unwrap(), late), -10);
    }

    #[test]
    fn fixed_clock_round_trips_wib_wall_time() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let time = NaiveTime::from_hms_opt(14, 5, 0).unwrap();
        let clock = FixedClock::at_wib(date, time);
        assert_eq!(clock.now(), utc("2025-01-06T07:05:00Z"));
        assert_eq!(today(clock.now()), date);
        assert_eq!(current_time(clock.now()), time);
    }
}
