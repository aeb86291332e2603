use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::ScheduleError;

/// A parsed schedule rule. Immutable once parsed; the normalized rule text
/// is kept as `description` and round-trips through [`Schedule::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    /// Normalized human-readable form of the rule.
    pub description: String,
    /// Active weekdays, indexed 0=Sunday .. 6=Saturday.
    #[serde(skip)]
    pub(crate) day_of_week: [bool; 7],
    #[serde(skip)]
    pub(crate) hour: u32,
    #[serde(skip)]
    pub(crate) minute: u32,
    /// Raw `key=value` settings; unknown keys are stored uninterpreted.
    #[serde(skip)]
    pub(crate) settings: HashMap<String, String>,
}

/// Value of the `state` setting on a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateDirective {
    /// Persist the current replica count before scaling.
    Save,
    /// Scale back to the previously persisted replica count.
    Restore,
}

impl Schedule {
    /// Parse a schedule rule like `"Mon-Fri 8:00 replicas=1"`.
    pub fn parse(text: &str) -> Result<Schedule, ScheduleError> {
        crate::parse::parse(text)
    }

    /// Compute the first occurrence of this schedule at or after `now`.
    ///
    /// The schedule's wall-clock time is interpreted in `tz`. Walks at most
    /// 8 calendar days; a schedule always has at least one active weekday,
    /// so a match is found within 7; the bound only trips on a schedule
    /// constructed without any active day, which parsing rejects.
    pub fn next_trigger(&self, now: DateTime<Utc>, tz: Tz) -> Result<DateTime<Utc>, ScheduleError> {
        let mut date = now.with_timezone(&tz).date_naive();
        for _ in 0..8 {
            match self.trigger_on(date, tz) {
                Some(candidate) if now <= candidate && self.on_day(candidate.weekday()) => {
                    return Ok(candidate.with_timezone(&Utc));
                }
                // Passed already, wrong weekday, or the wall-clock time does
                // not exist on this date (DST gap): try the next day.
                _ => date = date.succ_opt().expect("calendar overflow"),
            }
        }
        Err(ScheduleError::NoNextTrigger(self.description.clone()))
    }

    /// The schedule's wall-clock instant on `date`, or `None` when that
    /// local time does not exist (spring-forward gap). Ambiguous times
    /// (fall-back overlap) resolve to the earlier instant.
    fn trigger_on(&self, date: NaiveDate, tz: Tz) -> Option<DateTime<Tz>> {
        date.and_hms_opt(self.hour, self.minute, 0)
            .and_then(|naive| naive.and_local_timezone(tz).earliest())
    }

    fn on_day(&self, day: chrono::Weekday) -> bool {
        self.day_of_week[day.num_days_from_sunday() as usize]
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
