use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::model::holiday::Holiday;

/// Why a date is not a school day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum NonWorkday {
    Friday,
    Holiday(String),
}

/// Friday is always off; listed holidays are off.
#[derive(Debug, Clone, Default)]
pub struct WorkdayCalendar {
    holidays: BTreeMap<NaiveDate, String>,
}

impl WorkdayCalendar {
    pub fn new<I>(holidays: I) -> Self
    where
        I: IntoIterator<Item = Holiday>,
    {
        Self {
            holidays: holidays.into_iter().map(|h| (h.date, h.name)).collect(),
        }
    }

    pub fn non_workday(&self, date: NaiveDate) -> Option<NonWorkday> {
        if date.weekday() == Weekday::Fri {
            return Some(NonWorkday::Friday);
        }
        self.holidays
            .get(&date)
            .map(|name| NonWorkday::Holiday(name.clone()))
    }

    pub fn is_workday(&self, date: NaiveDate) -> bool {
        self.non_workday(date).is_none()
    }
}

/// Every date from `start` to `end`, both inclusive. Empty when inverted.
pub fn dates_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn friday_is_never_a_workday() {
        let cal = WorkdayCalendar::default();
        assert_eq!(cal.non_workday(d(2025, 1, 10)), Some(NonWorkday::Friday));
        assert!(cal.is_workday(d(2025, 1, 11)));
        assert!(cal.is_workday(d(2025, 1, 12)));
    }

    #[test]
    fn holidays_are_excluded_by_name() {
        let cal = WorkdayCalendar::new(vec![Holiday {
            id: 1,
            date: d(2025, 1, 8),
            name: "Isra Miraj".into(),
        }]);
        assert_eq!(
            cal.non_workday(d(2025, 1, 8)),
            Some(NonWorkday::Holiday("Isra Miraj".into()))
        );
        assert!(cal.is_workday(d(2025, 1, 7)));
    }

    #[test]
    fn range_is_inclusive() {
        let days = dates_between(d(2025, 1, 30), d(2025, 2, 2));
        assert_eq!(days, vec![d(2025, 1, 30), d(2025, 1, 31), d(2025, 2, 1), d(2025, 2, 2)]);
        assert_eq!(dates_between(d(2025, 1, 6), d(2025, 1, 6)), vec![d(2025, 1, 6)]);
        assert!(dates_between(d(2025, 1, 7), d(2025, 1, 6)).is_empty());
    }
}
