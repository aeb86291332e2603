//! Priority-resolved store of discovered workloads.

use std::collections::HashMap;
use std::sync::Mutex;

use lightsout_scanner::Object;

/// Holds, per workload uid, the candidates contributed by the configured
/// scanners and resolves reads to the highest-priority one.
///
/// Candidates for a uid are kept in a small vector ordered by descending
/// priority; at most one candidate exists per priority value (a second add
/// at an occupied priority replaces in place). Removal is a linear scan;
/// per-uid cardinality equals the number of configured scanners, which is
/// expected to stay in the single digits, so the simpler container beats a
/// heap here.
///
/// This is the only mutable state shared between the agent's tasks; every
/// operation takes the one internal lock for the duration of the call and
/// nothing else ever holds it, so critical sections stay short.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    entries: Mutex<HashMap<String, Vec<Object>>>,
}

impl ObjectRegistry {
    pub fn new() -> ObjectRegistry {
        ObjectRegistry::default()
    }

    /// Add (or replace) a candidate under its uid.
    pub fn add(&self, obj: Object) {
        let mut entries = self.entries.lock().unwrap();
        let candidates = entries.entry(obj.uid.clone()).or_default();
        if let Some(existing) = candidates
            .iter_mut()
            .find(|c| c.priority == obj.priority)
        {
            *existing = obj;
            return;
        }
        let at = candidates
            .iter()
            .position(|c| c.priority < obj.priority)
            .unwrap_or(candidates.len());
        candidates.insert(at, obj);
    }

    /// Remove the candidate matching `obj`'s uid and exact priority, if any.
    pub fn remove(&self, obj: &Object) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(candidates) = entries.get_mut(&obj.uid) {
            candidates.retain(|c| c.priority != obj.priority);
            if candidates.is_empty() {
                entries.remove(&obj.uid);
            }
        }
    }

    /// The current view: for every known uid, a deep copy of its
    /// highest-priority candidate. Mutating a returned object never affects
    /// the registry.
    pub fn get_objects(&self) -> HashMap<String, Object> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .filter_map(|(uid, candidates)| {
                candidates.first().map(|obj| (uid.clone(), obj.clone()))
            })
            .collect()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
