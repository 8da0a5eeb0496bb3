//! Daily study streak.
//!
//! A streak counts consecutive calendar days with at least one recorded
//! activity. Days are calendar dates, not instants; which calendar is
//! used is decided by [`CalendarPolicy`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use finempoder_store::StreakRecord;
use serde::{Deserialize, Serialize};

use crate::error::ProgressError;

/// How an instant maps to a calendar day.
///
/// `Local` follows the device clock and timezone, so travelling across
/// timezones or a DST change can shift "today". `Utc` is stable across
/// timezones but rolls over at UTC midnight, not the learner's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarPolicy {
    #[default]
    Local,
    Utc,
}

impl CalendarPolicy {
    /// Calendar day containing `now`.
    pub fn day_of(&self, now: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => now.with_timezone(&Local).date_naive(),
            Self::Utc => now.date_naive(),
        }
    }
}

impl fmt::Display for CalendarPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Utc => "utc",
        })
    }
}

impl FromStr for CalendarPolicy {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "utc" => Ok(Self::Utc),
            other => Err(ProgressError::UnknownCalendar(other.to_string())),
        }
    }
}

/// Streak counters as shown to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSnapshot {
    pub current: u32,
    pub best: u32,
    pub last_active: Option<NaiveDate>,
    /// At least one activity has been recorded today.
    pub today_done: bool,
}

impl StreakSnapshot {
    pub fn new(record: StreakRecord, today: NaiveDate) -> Self {
        Self {
            current: record.current,
            best: record.best,
            last_active: record.last_active,
            today_done: today_done(&record, today),
        }
    }
}

/// Apply one activity on `today` to `prev`.
///
/// - already active today: `current` stays, floored at 1;
/// - active yesterday: `current + 1`;
/// - otherwise (gap, first ever, or a clock that moved backwards): restart at 1.
///
/// `best` never drops below `current`.
pub fn advance(prev: StreakRecord, today: NaiveDate) -> StreakRecord {
    let yesterday = today.pred_opt();

    let current = match prev.last_active {
        Some(last) if last == today => prev.current.max(1),
        Some(last) if Some(last) == yesterday => prev.current.saturating_add(1),
        _ => 1,
    };

    StreakRecord {
        current,
        best: prev.best.max(current),
        last_active: Some(today),
    }
}

/// Whether an activity has already been recorded on `today`.
pub fn today_done(record: &StreakRecord, today: NaiveDate) -> bool {
    record.last_active == Some(today)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn run(days: &[NaiveDate]) -> StreakRecord {
        days.iter()
            .fold(StreakRecord::default(), |acc, d| advance(acc, *d))
    }

    #[test]
    fn first_activity_starts_at_one() {
        let rec = advance(StreakRecord::default(), day(1, 1));
        assert_eq!(rec.current, 1);
        assert_eq!(rec.best, 1);
        assert_eq!(rec.last_active, Some(day(1, 1)));
    }

    #[test]
    fn consecutive_days_then_gap() {
        let rec = run(&[day(1, 1), day(1, 2), day(1, 3)]);
        assert_eq!((rec.current, rec.best), (3, 3));

        let rec = advance(rec, day(1, 5));
        assert_eq!((rec.current, rec.best), (1, 3));
    }

    #[test]
    fn same_day_is_idempotent() {
        let once = advance(StreakRecord::default(), day(1, 1));
        let twice = advance(once, day(1, 1));
        assert_eq!(once.current, 1);
        assert_eq!(twice, once);
    }

    #[test]
    fn same_day_floors_corrupted_zero() {
        let corrupted = StreakRecord {
            current: 0,
            best: 4,
            last_active: Some(day(1, 1)),
        };
        let rec = advance(corrupted, day(1, 1));
        assert_eq!(rec.current, 1);
        assert_eq!(rec.best, 4);
    }

    #[test]
    fn crosses_month_and_year_boundaries() {
        let rec = run(&[day(1, 31), day(2, 1)]);
        assert_eq!(rec.current, 2);

        let new_year = [
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        ];
        assert_eq!(run(&new_year).current, 2);
    }

    #[test]
    fn clock_moving_backwards_restarts() {
        let rec = run(&[day(1, 10), day(1, 11)]);
        let rec = advance(rec, day(1, 9));
        assert_eq!(rec.current, 1);
        assert_eq!(rec.best, 2);
    }

    #[test]
    fn best_never_below_current() {
        let mut rec = StreakRecord::default();
        for d in [1, 2, 3, 7, 8, 9, 10, 11, 20] {
            rec = advance(rec, day(3, d));
            assert!(rec.best >= rec.current);
        }
        assert_eq!(rec.best, 5);
    }

    #[test]
    fn today_done_tracks_last_active() {
        let rec = advance(StreakRecord::default(), day(1, 1));
        assert!(today_done(&rec, day(1, 1)));
        assert!(!today_done(&rec, day(1, 2)));

        let snap = StreakSnapshot::new(rec, day(1, 2));
        assert!(!snap.today_done);
        assert_eq!(snap.current, 1);
    }

    #[test]
    fn utc_policy_uses_utc_date() {
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
        assert_eq!(CalendarPolicy::Utc.day_of(late), day(1, 1));
    }

    #[test]
    fn policy_parses() {
        assert_eq!("UTC".parse::<CalendarPolicy>().unwrap(), CalendarPolicy::Utc);
        assert_eq!("local".parse::<CalendarPolicy>().unwrap(), CalendarPolicy::Local);
        assert!(matches!(
            "mars".parse::<CalendarPolicy>(),
            Err(ProgressError::UnknownCalendar(name)) if name == "mars"
        ));
    }
}
