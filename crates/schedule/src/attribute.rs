//! Typed accessors over the raw `key=value` settings of a schedule.
//!
//! Settings are stored uninterpreted at parse time; interpretation happens
//! here, on demand, so unknown keys never fail a parse.

use crate::error::ScheduleError;
use crate::schedule::{Schedule, StateDirective};

impl Schedule {
    /// Whether the schedule carries a `replicas` setting at all. Schedules
    /// without one are trigger-only and never cause a scale call.
    pub fn has_replicas(&self) -> bool {
        self.settings.contains_key("replicas")
    }

    /// The replica count this schedule scales to.
    pub fn replicas(&self) -> Result<i32, ScheduleError> {
        let raw = self
            .settings
            .get("replicas")
            .ok_or(ScheduleError::MissingReplicas)?;
        raw.parse()
            .map_err(|_| ScheduleError::InvalidReplicas(raw.clone()))
    }

    /// The save/restore directive, if any. A present but unrecognized value
    /// is an error.
    pub fn state(&self) -> Result<Option<StateDirective>, ScheduleError> {
        let Some(raw) = self.settings.get("state") else {
            return Ok(None);
        };
        match raw.to_lowercase().as_str() {
            "save" => Ok(Some(StateDirective::Save)),
            "restore" => Ok(Some(StateDirective::Restore)),
            _ => Err(ScheduleError::InvalidState(raw.clone())),
        }
    }

    /// Trigger ids named by this schedule, in first-seen order.
    pub fn triggers(&self) -> Vec<String> {
        self.id_list("trigger")
    }

    /// Keepalive hook ids named by this schedule, in first-seen order.
    pub fn keep_alives(&self) -> Vec<String> {
        self.id_list("keepalive")
    }

    /// A raw setting value, for callers interpreting unknown keys.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    fn id_list(&self, key: &str) -> Vec<String> {
        let Some(raw) = self.settings.get(key) else {
            return Vec::new();
        };
        raw.split(',')
            .filter(|id| !id.is_empty())
            .map(|id| id.to_lowercase())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replicas_present() {
        let s = Schedule::parse("Mon 8:00 replicas=3").unwrap();
        assert!(s.has_replicas());
        assert_eq!(s.replicas().unwrap(), 3);
    }

    #[test]
    fn replicas_absent_errors() {
        let s = Schedule::parse("Mon 8:00 trigger=backup").unwrap();
        assert!(!s.has_replicas());
        assert!(matches!(s.replicas(), Err(ScheduleError::MissingReplicas)));
    }

    #[test]
    fn replicas_non_numeric_errors() {
        let s = Schedule::parse("Mon 8:00 replicas=lots").unwrap();
        assert!(matches!(s.replicas(), Err(ScheduleError::InvalidReplicas(_))));
    }

    #[test]
    fn state_absent_is_none() {
        let s = Schedule::parse("Mon 8:00 replicas=1").unwrap();
        assert_eq!(s.state().unwrap(), None);
    }

    #[test]
    fn state_save_and_restore() {
        let s = Schedule::parse("Mon 8:00 state=save").unwrap();
        assert_eq!(s.state().unwrap(), Some(StateDirective::Save));
        let s = Schedule::parse("Mon 8:00 state=Restore").unwrap();
        assert_eq!(s.state().unwrap(), Some(StateDirective::Restore));
    }

    #[test]
    fn state_unrecognized_errors() {
        let s = Schedule::parse("Mon 8:00 state=pause").unwrap();
        assert!(matches!(s.state(), Err(ScheduleError::InvalidState(_))));
    }

    #[test]
    fn triggers_split_and_skip_empty() {
        let s = Schedule::parse("Mon 8:00 trigger=backup,,notify").unwrap();
        assert_eq!(s.triggers(), vec!["backup".to_string(), "notify".to_string()]);
    }

    #[test]
    fn triggers_absent_is_empty() {
        let s = Schedule::parse("Mon 8:00 replicas=1").unwrap();
        assert!(s.triggers().is_empty());
    }

    #[test]
    fn keep_alives_parsed() {
        let s = Schedule::parse("Mon 18:00 replicas=0 keepalive=sessions").unwrap();
        assert_eq!(s.keep_alives(), vec!["sessions".to_string()]);
    }
}
