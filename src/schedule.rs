//! Schedule definitions and next-run-time computation.
//!
//! The calculator is a pure function over the schedule and a supplied `now`:
//! no clock reads, no hidden state. All wall-clock times are UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on the day-by-day search for a recurring schedule. If no day
/// within a year satisfies the period, the schedule is treated as anomalous
/// and falls back to `now + 24h`.
const LOOKAHEAD_DAYS: i64 = 366;

/// Recurrence constraint for a continuous schedule.
///
/// An empty weekday set and an unset day-of-month mean "every day" within
/// the date bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_day: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_day: Option<NaiveDate>,
    #[serde(default)]
    pub days_of_week: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_month: Option<String>,
}

/// A job's schedule: exactly one future run, or a recurring run constrained
/// by a [`Period`].
///
/// `time` stays a string on purpose: a malformed time is a runtime
/// scheduling anomaly (handled with a fallback), not a deserialization
/// failure. The Validator rejects it at creation; anything that slips
/// through degrades to the fallback instead of wedging the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum Schedule {
    Once {
        #[serde(rename = "Time")]
        time: String,
    },
    Continuous {
        #[serde(rename = "Time")]
        time: String,
        #[serde(rename = "Period")]
        period: Option<Period>,
    },
}

impl Schedule {
    pub fn is_once(&self) -> bool {
        matches!(self, Schedule::Once { .. })
    }
}

/// Compute the next execution instant strictly after `now`.
///
/// Never fails: a malformed time-of-day or an unsatisfiable period degrades
/// to `now + 24h` with a warning.
pub fn next_run_time(schedule: &Schedule, now: DateTime<Utc>) -> DateTime<Utc> {
    match schedule {
        Schedule::Once { time } => {
            let Some(tod) = parse_time(time) else {
                return fallback(time, now);
            };
            let mut candidate = now.date_naive().and_time(tod).and_utc();
            if candidate <= now {
                candidate += Duration::days(1);
            }
            candidate
        }
        Schedule::Continuous { time, period } => {
            let Some(tod) = parse_time(time) else {
                return fallback(time, now);
            };
            let period = period.clone().unwrap_or_default();

            // Start the search no earlier than the period's first day.
            let mut date = now.date_naive();
            if let Some(start) = period.start_day {
                if start > date {
                    date = start;
                }
            }
            let mut candidate = date.and_time(tod).and_utc();
            if candidate <= now {
                candidate += Duration::days(1);
            }

            for _ in 0..LOOKAHEAD_DAYS {
                if period_matches(&period, candidate.date_naive()) {
                    return candidate;
                }
                candidate += Duration::days(1);
            }

            tracing::warn!(
                ?period,
                "No valid run day within {} days, falling back to 24h",
                LOOKAHEAD_DAYS
            );
            now + Duration::days(1)
        }
    }
}

/// Whether `date` satisfies the period constraint.
///
/// Matching order is part of the observable contract:
/// 1. dates outside `[start_day, end_day]` are rejected (bounds inclusive;
///    the end day counts through its last instant);
/// 2. a day-of-month hit accepts immediately, even when a weekday filter is
///    present and would reject;
/// 3. otherwise a non-empty weekday filter decides;
/// 4. otherwise the date is accepted only if no day-of-month was specified.
///
/// The day-of-month comparison is a literal string match of the whole field
/// against the day number, so "1,15" matches nothing. Kept as-is; see the
/// pinning test in tests/schedule_tests.rs.
fn period_matches(period: &Period, date: NaiveDate) -> bool {
    if let Some(start) = period.start_day {
        if date < start {
            return false;
        }
    }
    if let Some(end) = period.end_day {
        if date > end {
            return false;
        }
    }

    if let Some(ref dom) = period.days_of_month {
        if date.day().to_string() == *dom {
            return true;
        }
    }

    if !period.days_of_week.is_empty() {
        let weekday = weekday_name(date);
        return period.days_of_week.iter().any(|d| d == weekday);
    }

    period.days_of_month.is_none()
}

pub(crate) fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S").ok()
}

pub(crate) fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

pub(crate) const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn fallback(time: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    tracing::warn!(time, "Unparseable schedule time, falling back to 24h");
    now + Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn once_later_today() {
        let schedule = Schedule::Once {
            time: "18:30:00".to_string(),
        };
        let now = at("2026-03-02T10:00:00Z");
        assert_eq!(next_run_time(&schedule, now), at("2026-03-02T18:30:00Z"));
    }

    #[test]
    fn once_already_passed_rolls_to_tomorrow() {
        let schedule = Schedule::Once {
            time: "06:00:00".to_string(),
        };
        let now = at("2026-03-02T10:00:00Z");
        assert_eq!(next_run_time(&schedule, now), at("2026-03-03T06:00:00Z"));
    }

    #[test]
    fn once_exact_boundary_is_not_today() {
        // "strictly after now": an instant equal to now rolls over
        let schedule = Schedule::Once {
            time: "10:00:00".to_string(),
        };
        let now = at("2026-03-02T10:00:00Z");
        assert_eq!(next_run_time(&schedule, now), at("2026-03-03T10:00:00Z"));
    }

    #[test]
    fn malformed_time_falls_back_24h() {
        let schedule = Schedule::Once {
            time: "25:99:00".to_string(),
        };
        let now = at("2026-03-02T10:00:00Z");
        assert_eq!(next_run_time(&schedule, now), now + Duration::days(1));
    }

    #[test]
    fn continuous_every_day_within_bounds() {
        // Today's 02:00 already passed, so the next run is tomorrow 02:00
        let schedule = Schedule::Continuous {
            time: "02:00:00".to_string(),
            period: Some(Period {
                start_day: Some(NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()),
                end_day: Some(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()),
                ..Default::default()
            }),
        };
        let now = at("2026-02-10T10:00:00Z");
        assert_eq!(next_run_time(&schedule, now), at("2026-02-11T02:00:00Z"));
    }

    #[test]
    fn continuous_starts_at_future_start_day() {
        let schedule = Schedule::Continuous {
            time: "08:00:00".to_string(),
            period: Some(Period {
                start_day: Some(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()),
                ..Default::default()
            }),
        };
        let now = at("2026-03-02T10:00:00Z");
        assert_eq!(next_run_time(&schedule, now), at("2026-06-01T08:00:00Z"));
    }

    #[test]
    fn continuous_weekday_filter_lands_on_monday() {
        let schedule = Schedule::Continuous {
            time: "09:00:00".to_string(),
            period: Some(Period {
                days_of_week: vec!["Monday".to_string()],
                ..Default::default()
            }),
        };
        // 2026-03-02 is a Monday, but 09:00 already passed; next Monday is 03-09
        let now = at("2026-03-02T10:00:00Z");
        let next = next_run_time(&schedule, now);
        assert_eq!(next, at("2026-03-09T09:00:00Z"));
        assert_eq!(weekday_name(next.date_naive()), "Monday");
    }

    #[test]
    fn end_day_is_inclusive() {
        let schedule = Schedule::Continuous {
            time: "23:00:00".to_string(),
            period: Some(Period {
                end_day: Some(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()),
                ..Default::default()
            }),
        };
        let now = at("2026-03-02T10:00:00Z");
        assert_eq!(next_run_time(&schedule, now), at("2026-03-02T23:00:00Z"));
    }

    #[test]
    fn expired_period_falls_back_24h() {
        let schedule = Schedule::Continuous {
            time: "02:00:00".to_string(),
            period: Some(Period {
                end_day: Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
                ..Default::default()
            }),
        };
        let now = at("2026-03-02T10:00:00Z");
        assert_eq!(next_run_time(&schedule, now), now + Duration::days(1));
    }

    #[test]
    fn day_of_month_wins_over_weekday_filter() {
        // 2026-03-15 is a Sunday; the weekday filter alone would push the
        // run to a Monday, but the day-of-month hit accepts it first.
        let schedule = Schedule::Continuous {
            time: "04:00:00".to_string(),
            period: Some(Period {
                days_of_week: vec!["Monday".to_string()],
                days_of_month: Some("15".to_string()),
                ..Default::default()
            }),
        };
        let now = at("2026-03-10T10:00:00Z");
        // First acceptable day scanning forward: 2026-03-15 (day-of-month hit)
        assert_eq!(next_run_time(&schedule, now), at("2026-03-15T04:00:00Z"));
    }

    #[test]
    fn day_of_month_without_weekdays_rejects_other_days() {
        let schedule = Schedule::Continuous {
            time: "04:00:00".to_string(),
            period: Some(Period {
                days_of_month: Some("20".to_string()),
                ..Default::default()
            }),
        };
        let now = at("2026-03-10T10:00:00Z");
        assert_eq!(next_run_time(&schedule, now), at("2026-03-20T04:00:00Z"));
    }

    #[test]
    fn schedule_wire_shape_round_trips() {
        let json = r#"{"Type":"Continuous","Time":"02:00:00","Period":{"StartDay":"2026-02-10","EndDay":"2026-12-31","DaysOfWeek":[],"DaysOfMonth":null}}"#;
        let schedule: Schedule = serde_json::from_str(json).unwrap();
        match &schedule {
            Schedule::Continuous { time, period } => {
                assert_eq!(time, "02:00:00");
                let period = period.as_ref().unwrap();
                assert_eq!(
                    period.start_day,
                    Some(NaiveDate::from_ymd_opt(2026, 2, 10).unwrap())
                );
                assert!(period.days_of_week.is_empty());
                assert!(period.days_of_month.is_none());
            }
            _ => panic!("expected continuous schedule"),
        }
    }

    #[test]
    fn once_wire_shape_accepts_null_free_form() {
        let json = r#"{"Type":"Once","Time":"18:30:00"}"#;
        let schedule: Schedule = serde_json::from_str(json).unwrap();
        assert!(schedule.is_once());
    }
}
