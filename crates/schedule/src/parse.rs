//! Parser for the schedule rule DSL.
//!
//! Grammar: `<weekdays> <HH:MM> [key=value ..]` where `<weekdays>` is a
//! comma-separated list of three-letter weekday names or ascending ranges
//! (`mon-fri`). Parsing is case-insensitive; the normalized (lowercased,
//! whitespace-collapsed) text is stored as the schedule description.

use std::collections::HashMap;

use crate::error::ScheduleError;
use crate::schedule::Schedule;

pub(crate) fn parse(text: &str) -> Result<Schedule, ScheduleError> {
    let description = normalize(text);

    // The time separator becomes a field separator so "8:00" splits into
    // an hour and a minute field.
    let spaced = description.replace(':', " ");
    let fields: Vec<&str> = spaced.split(' ').collect();
    if fields.len() < 3 {
        return Err(ScheduleError::Incomplete(description));
    }

    let day_of_week = parse_weekdays(fields[0])?;

    let hour: u32 = fields[1]
        .parse()
        .ok()
        .filter(|h| *h <= 23)
        .ok_or_else(|| ScheduleError::InvalidHour(fields[1].to_string()))?;
    let minute: u32 = fields[2]
        .parse()
        .ok()
        .filter(|m| *m <= 59)
        .ok_or_else(|| ScheduleError::InvalidMinute(fields[2].to_string()))?;

    let mut settings = HashMap::new();
    for kv in &fields[3..] {
        let mut parts = kv.splitn(3, '=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => {
                settings.insert(key.to_string(), value.to_string());
            }
            _ => return Err(ScheduleError::InvalidSetting(kv.to_string())),
        }
    }

    Ok(Schedule {
        description,
        day_of_week,
        hour,
        minute,
        settings,
    })
}

/// Parse the weekday part of a rule into the 7-slot day set.
fn parse_weekdays(text: &str) -> Result<[bool; 7], ScheduleError> {
    let mut days = [false; 7];
    for part in text.split(',') {
        match part.matches('-').count() {
            0 => {
                let day = weekday(part)?;
                days[(day % 7) as usize] = true;
            }
            1 => {
                let (from, to) = part.split_once('-').expect("counted one dash");
                let from = weekday(from)?;
                let to = weekday(to)?;
                if from >= to {
                    return Err(ScheduleError::InvalidDayRange(part.to_string()));
                }
                for day in from..=to {
                    days[(day % 7) as usize] = true;
                }
            }
            _ => return Err(ScheduleError::InvalidDayRange(part.to_string())),
        }
    }
    Ok(days)
}

/// Map a three-letter weekday name onto its rank. Sunday maps to 7 so that
/// ranges like `fri-sun` ascend; the day-set index is taken modulo 7.
fn weekday(text: &str) -> Result<u8, ScheduleError> {
    match text {
        "mon" => Ok(1),
        "tue" => Ok(2),
        "wed" => Ok(3),
        "thu" => Ok(4),
        "fri" => Ok(5),
        "sat" => Ok(6),
        "sun" => Ok(7),
        _ => Err(ScheduleError::InvalidWeekday(text.to_string())),
    }
}

/// Trim, collapse whitespace runs, glue comma/range separators to their
/// neighbors, and lowercase.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(", ", ",")
        .replace("- ", "-")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_rule() {
        let s = Schedule::parse("Mon-Fri 8:00 replicas=1").unwrap();
        assert_eq!(s.description, "mon-fri 8:00 replicas=1");
        assert_eq!(s.hour, 8);
        assert_eq!(s.minute, 0);
        // Monday..Friday active, weekend not.
        assert_eq!(s.day_of_week, [false, true, true, true, true, true, false]);
        assert_eq!(s.settings.get("replicas"), Some(&"1".to_string()));
    }

    #[test]
    fn parse_day_list_and_range_mix() {
        let s = Schedule::parse("Sat,Sun,Mon-Wed 14:30 replicas=0").unwrap();
        assert_eq!(s.day_of_week, [true, true, true, true, false, false, true]);
        assert_eq!(s.hour, 14);
        assert_eq!(s.minute, 30);
    }

    #[test]
    fn parse_range_to_sunday() {
        // Sunday ranks last, so fri-sun is an ascending range.
        let s = Schedule::parse("Fri-Sun 20:00 replicas=0").unwrap();
        assert_eq!(s.day_of_week, [true, false, false, false, false, true, true]);
    }

    #[test]
    fn parse_is_case_insensitive() {
        let a = Schedule::parse("MON-FRI 8:00 Replicas=1").unwrap();
        let b = Schedule::parse("mon-fri 8:00 replicas=1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_normalizes_spacing() {
        let s = Schedule::parse("  Mon-Fri   8:00  replicas=1 ").unwrap();
        assert_eq!(s.description, "mon-fri 8:00 replicas=1");
    }

    #[test]
    fn parse_glues_comma_separated_day_list() {
        let s = Schedule::parse("Sat, Sun 14:00 replicas=1").unwrap();
        assert_eq!(s.description, "sat,sun 14:00 replicas=1");
    }

    #[test]
    fn parse_roundtrips_description() {
        let s = Schedule::parse("Sat, Sun 14:00 replicas=1 trigger=backup,notify").unwrap();
        let reparsed = Schedule::parse(&s.description).unwrap();
        assert_eq!(s, reparsed);
    }

    #[test]
    fn parse_multiple_settings() {
        let s = Schedule::parse("Thu 10:00 state=save replicas=0 trigger=backup").unwrap();
        assert_eq!(s.settings.len(), 3);
        assert_eq!(s.settings.get("state"), Some(&"save".to_string()));
    }

    #[test]
    fn parse_unknown_settings_are_kept() {
        let s = Schedule::parse("Mon 8:00 flavor=blue").unwrap();
        assert_eq!(s.settings.get("flavor"), Some(&"blue".to_string()));
    }

    #[test]
    fn parse_descending_range_fails() {
        assert!(Schedule::parse("Fri-Mon 8:00 replicas=1").is_err());
    }

    #[test]
    fn parse_single_day_range_fails() {
        assert!(Schedule::parse("Mon-Mon 8:00 replicas=1").is_err());
    }

    #[test]
    fn parse_double_dash_range_fails() {
        assert!(Schedule::parse("Mon-Wed-Fri 8:00 replicas=1").is_err());
    }

    #[test]
    fn parse_unknown_weekday_fails() {
        assert!(Schedule::parse("Funday 8:00 replicas=1").is_err());
    }

    #[test]
    fn parse_hour_out_of_range_fails() {
        assert!(Schedule::parse("Mon 24:00 replicas=1").is_err());
        assert!(Schedule::parse("Mon -1:00 replicas=1").is_err());
    }

    #[test]
    fn parse_minute_out_of_range_fails() {
        assert!(Schedule::parse("Mon 8:60 replicas=1").is_err());
    }

    #[test]
    fn parse_malformed_setting_fails() {
        assert!(Schedule::parse("Mon 8:00 replicas").is_err());
        assert!(Schedule::parse("Mon 8:00 a=b=c").is_err());
    }

    #[test]
    fn parse_incomplete_rule_fails() {
        assert!(Schedule::parse("Mon").is_err());
        assert!(Schedule::parse("").is_err());
    }
}
