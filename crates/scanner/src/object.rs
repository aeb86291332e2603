use serde::Serialize;

use lightsout_schedule::Schedule;

use crate::config::ScannerConfig;

/// A workload candidate discovered by a scanner.
///
/// `uid` is the scanner-assigned stable identity; several scanners may
/// contribute candidates for the same uid at different priorities. Cloning
/// an `Object` yields a deep copy (schedules included), which is what the
/// registry hands out so its internal state is never aliased by callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Object {
    pub uid: String,
    pub namespace: String,
    pub name: String,
    /// Scanner kind tag this object was discovered by.
    pub kind: String,
    pub schedules: Vec<Schedule>,
    /// Replica count persisted by an earlier `state=save` schedule, if any.
    pub state: Option<SavedState>,
    /// Last observed replica count.
    pub replicas: i32,
    pub priority: i32,
}

/// Previously persisted replica count, restored by `state=restore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SavedState {
    pub replicas: i32,
}

impl Object {
    /// Seed an object with the scanner-level fields from `cfg`; the
    /// implementation fills in identity and observed state per workload.
    pub fn for_scanner(cfg: &ScannerConfig) -> Object {
        Object {
            uid: String::new(),
            namespace: cfg.namespace.clone(),
            name: String::new(),
            kind: cfg.kind.clone(),
            schedules: cfg.default_schedules.clone(),
            state: None,
            replicas: 0,
            priority: cfg.priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_scanner_seeds_scope_fields() {
        let cfg = ScannerConfig {
            namespace: "batch".into(),
            label_selector: "team=data".into(),
            default_schedules: vec![Schedule::parse("mon-fri 8:00 replicas=1").unwrap()],
            kind: "deployment".into(),
            priority: 2,
        };
        let obj = Object::for_scanner(&cfg);
        assert_eq!(obj.namespace, "batch");
        assert_eq!(obj.kind, "deployment");
        assert_eq!(obj.priority, 2);
        assert_eq!(obj.schedules.len(), 1);
        assert!(obj.uid.is_empty());
    }

    #[test]
    fn clone_is_deep_for_schedules() {
        let mut a = Object::for_scanner(&ScannerConfig {
            default_schedules: vec![Schedule::parse("mon 8:00 replicas=1").unwrap()],
            ..Default::default()
        });
        let b = a.clone();
        a.schedules.clear();
        assert_eq!(b.schedules.len(), 1);
    }
}
