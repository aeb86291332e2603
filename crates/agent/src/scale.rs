//! Per-tick derivation and application of scale events.
//!
//! Each tick walks the window since the previous tick and derives every
//! schedule occurrence that fell inside it, so an agent outage or a tick
//! interval coarser than a day never silently skips transitions: missed
//! occurrences are caught up in chronological order.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use lightsout_scanner::{Object, SavedState, Scanner};
use lightsout_schedule::{Schedule, StateDirective};
use lightsout_trigger::KeepAlive;

use crate::delay::{DelayCache, KEEPALIVE_CACHE_TTL};
use crate::dispatch::{accumulate, TriggerBatch};
use crate::metrics::AgentMetrics;
use crate::registry::ObjectRegistry;

/// Bound on the very first catch-up window, so a fresh agent replays at
/// most the last hour instead of unbounded history.
const FIRST_TICK_WINDOW_MINUTES: i64 = 60;

/// One schedule occurrence that fell due within the current tick window.
#[derive(Debug, Clone)]
pub(crate) struct ScaleEvent {
    pub(crate) at: DateTime<Utc>,
    pub(crate) uid: String,
    pub(crate) schedule: Schedule,
    /// Replica count persisted by a `state=save` directive, once resolved.
    pub(crate) save: Option<i32>,
    /// Scale back to the workload's saved state instead of the schedule's
    /// replica setting.
    pub(crate) restore: bool,
    /// Postponed by a keepalive in an earlier tick; triggers were already
    /// accumulated back then.
    pub(crate) redelivered: bool,
}

/// Derive all events in `(past, now]` for the given workload snapshot,
/// sorted ascending by occurrence time (stable: ties keep discovery order).
///
/// The walk advances day by day, but each next anchor starts one calendar
/// day after the previous *occurrence*, so occurrences per schedule are
/// strictly increasing and duplicates cannot arise even for schedules whose
/// days recur less often than daily.
pub(crate) fn collect_events(
    objects: &HashMap<String, Object>,
    past: DateTime<Utc>,
    now: DateTime<Utc>,
    tz: Tz,
) -> Vec<ScaleEvent> {
    let mut events = Vec::new();
    for (uid, obj) in objects {
        for schedule in &obj.schedules {
            let mut anchor = past;
            while anchor <= now {
                let at = match schedule.next_trigger(anchor, tz) {
                    Ok(at) => at,
                    Err(e) => {
                        error!(uid = %uid, error = %e, "error computing next trigger");
                        break;
                    }
                };
                if at > past && at <= now {
                    events.push(ScaleEvent {
                        at,
                        uid: uid.clone(),
                        schedule: schedule.clone(),
                        save: None,
                        restore: false,
                        redelivered: false,
                    });
                }
                anchor = at + Duration::days(1);
            }
        }
    }
    events.sort_by_key(|event| event.at);
    events
}

/// Executes scale ticks against the registry's current view.
///
/// Scanner calls happen on copied-out objects; the registry lock is never
/// held across them.
pub(crate) struct ScaleProcessor {
    registry: Arc<ObjectRegistry>,
    /// Scanner to scale/save through, by workload kind.
    scalers: HashMap<String, Arc<dyn Scanner>>,
    keepalives: HashMap<String, Arc<dyn KeepAlive>>,
    metrics: Arc<RwLock<AgentMetrics>>,
    tz: Tz,
    /// End of the previous tick window.
    pub(crate) past: DateTime<Utc>,
    /// Events postponed by a keepalive, replayed next tick.
    pub(crate) delayed: Vec<ScaleEvent>,
    cache: DelayCache,
}

impl ScaleProcessor {
    pub(crate) fn new(
        registry: Arc<ObjectRegistry>,
        scalers: HashMap<String, Arc<dyn Scanner>>,
        keepalives: HashMap<String, Arc<dyn KeepAlive>>,
        metrics: Arc<RwLock<AgentMetrics>>,
        tz: Tz,
    ) -> ScaleProcessor {
        ScaleProcessor {
            registry,
            scalers,
            keepalives,
            metrics,
            tz,
            past: Utc::now() - Duration::minutes(FIRST_TICK_WINDOW_MINUTES),
            delayed: Vec::new(),
            cache: DelayCache::new(KEEPALIVE_CACHE_TTL),
        }
    }

    /// Process one tick: replay postponed events, derive the new window's
    /// events, apply state and scaling in chronological order, and return
    /// the accumulated trigger batches for dispatch.
    pub(crate) async fn tick(&mut self, now: DateTime<Utc>) -> Vec<TriggerBatch> {
        debug!("scale tick start");
        let mut objects = self.registry.get_objects();

        let mut events: Vec<ScaleEvent> = std::mem::take(&mut self.delayed);
        events.extend(collect_events(&objects, self.past, now, self.tz));

        let mut batches = Vec::new();
        for mut event in events {
            debug!(uid = %event.uid, at = %event.at, schedule = %event.schedule, "scale event");
            let Some(obj) = objects.get_mut(&event.uid) else {
                debug!(uid = %event.uid, "workload no longer known, dropping event");
                continue;
            };
            if !event.redelivered {
                accumulate(&mut batches, obj, &event.schedule.triggers());
            }

            let keepalives = event.schedule.keep_alives();
            if !keepalives.is_empty() && self.should_delay(&keepalives).await {
                info!(
                    namespace = %obj.namespace,
                    name = %obj.name,
                    "keepalive active, postponing scale event"
                );
                event.redelivered = true;
                self.delayed.push(event);
                continue;
            }

            if self.handle_state(&mut event, obj).await {
                self.apply_scale(&event, obj).await;
            }
        }

        self.past = now;
        self.metrics.write().unwrap().record_tick(now);
        debug!("scale tick finished");
        batches
    }

    /// Probe the named keepalive hooks (through the result cache); any live
    /// one postpones the event. Unknown ids are logged and ignored.
    async fn should_delay(&mut self, ids: &[String]) -> bool {
        for id in ids {
            let alive = match self.cache.get(id) {
                Some(alive) => alive,
                None => {
                    let Some(keepalive) = self.keepalives.get(id) else {
                        error!(id = %id, "non existing keepalive, ignored");
                        continue;
                    };
                    let alive = match keepalive.execute().await {
                        Ok(()) => true,
                        Err(e) => {
                            info!(id = %id, error = %e, "keepalive hook negative, will not delay");
                            false
                        }
                    };
                    self.cache.put(id, alive);
                    alive
                }
            };
            if alive {
                return true;
            }
        }
        false
    }

    /// Resolve the schedule's save/restore directive. Returns whether the
    /// event should proceed to scaling.
    async fn handle_state(&self, event: &mut ScaleEvent, obj: &mut Object) -> bool {
        let directive = match event.schedule.state() {
            Ok(directive) => directive,
            Err(e) => {
                error!(
                    namespace = %obj.namespace,
                    name = %obj.name,
                    error = %e,
                    "invalid state setting, skipping event"
                );
                return false;
            }
        };
        match directive {
            None => true,
            Some(StateDirective::Save) => {
                let Some(scanner) = self.scalers.get(&obj.kind) else {
                    error!(kind = %obj.kind, "no scanner registered for workload kind");
                    return false;
                };
                match scanner.save_state(obj).await {
                    Ok(replicas) => {
                        event.save = Some(replicas);
                        // A restore later in this same tick must observe it.
                        obj.state = Some(SavedState { replicas });
                        true
                    }
                    Err(e) => {
                        error!(
                            namespace = %obj.namespace,
                            name = %obj.name,
                            error = %e,
                            "error saving state, skipping event"
                        );
                        self.metrics.write().unwrap().record_scale_error();
                        false
                    }
                }
            }
            Some(StateDirective::Restore) => {
                if obj.state.is_none() {
                    warn!(
                        namespace = %obj.namespace,
                        name = %obj.name,
                        "no saved state available, skipping event"
                    );
                    return false;
                }
                event.restore = true;
                true
            }
        }
    }

    /// Apply the event's scaling action, if it has one.
    async fn apply_scale(&self, event: &ScaleEvent, obj: &mut Object) {
        let target = if event.restore {
            match obj.state {
                Some(state) => state.replicas,
                None => return,
            }
        } else if !event.schedule.has_replicas() {
            // Trigger-only schedule.
            return;
        } else {
            match event.schedule.replicas() {
                Ok(replicas) => replicas,
                Err(e) => {
                    error!(
                        namespace = %obj.namespace,
                        name = %obj.name,
                        error = %e,
                        "invalid replicas setting"
                    );
                    self.metrics.write().unwrap().record_scale_error();
                    return;
                }
            }
        };

        let Some(scanner) = self.scalers.get(&obj.kind) else {
            error!(kind = %obj.kind, "no scanner registered for workload kind");
            self.metrics.write().unwrap().record_scale_error();
            return;
        };
        match scanner.scale(obj, target).await {
            Ok(()) => {
                obj.replicas = target;
                info!(
                    namespace = %obj.namespace,
                    name = %obj.name,
                    replicas = target,
                    saved = event.save,
                    due = %event.at,
                    "scaled workload"
                );
                self.metrics
                    .write()
                    .unwrap()
                    .record_scale(&obj.namespace, &obj.name, target);
            }
            Err(e) => {
                error!(
                    namespace = %obj.namespace,
                    name = %obj.name,
                    error = %e,
                    "error scaling workload"
                );
                self.metrics.write().unwrap().record_scale_error();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use lightsout_scanner::ScannerConfig;

    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn snapshot(rules: &[&str]) -> HashMap<String, Object> {
        let mut obj = Object::for_scanner(&ScannerConfig {
            namespace: "dev".into(),
            kind: "deployment".into(),
            ..Default::default()
        });
        obj.uid = "x".into();
        obj.schedules = rules.iter().map(|r| Schedule::parse(r).unwrap()).collect();
        HashMap::from([("x".to_string(), obj)])
    }

    #[test]
    fn catch_up_produces_one_event_per_weekday() {
        let objects = snapshot(&["mon-fri 8:00 replicas=1"]);
        // 2024-01-01 is a Monday; window covers the whole week.
        let past = utc(2024, 1, 1, 0, 0);
        let now = utc(2024, 1, 7, 23, 59);
        let events = collect_events(&objects, past, now, Tz::UTC);

        assert_eq!(events.len(), 5);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.at, utc(2024, 1, 1 + i as u32, 8, 0));
        }
    }

    #[test]
    fn events_sorted_across_schedules() {
        let objects = snapshot(&["mon-fri 18:00 replicas=0", "mon-fri 8:00 replicas=3"]);
        let past = utc(2024, 1, 1, 0, 0);
        let now = utc(2024, 1, 2, 23, 59);
        let events = collect_events(&objects, past, now, Tz::UTC);

        let times: Vec<DateTime<Utc>> = events.iter().map(|e| e.at).collect();
        assert_eq!(
            times,
            vec![
                utc(2024, 1, 1, 8, 0),
                utc(2024, 1, 1, 18, 0),
                utc(2024, 1, 2, 8, 0),
                utc(2024, 1, 2, 18, 0),
            ]
        );
    }

    #[test]
    fn occurrence_at_window_start_is_not_refired() {
        let objects = snapshot(&["mon-fri 8:00 replicas=1"]);
        // The previous tick ended exactly on the occurrence.
        let past = utc(2024, 1, 1, 8, 0);
        let now = utc(2024, 1, 1, 12, 0);
        assert!(collect_events(&objects, past, now, Tz::UTC).is_empty());
    }

    #[test]
    fn occurrence_at_window_end_is_fired() {
        let objects = snapshot(&["mon-fri 8:00 replicas=1"]);
        let past = utc(2024, 1, 1, 7, 0);
        let now = utc(2024, 1, 1, 8, 0);
        let events = collect_events(&objects, past, now, Tz::UTC);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].at, now);
    }

    #[test]
    fn sparse_schedule_never_duplicates_occurrences() {
        let objects = snapshot(&["mon 8:00 replicas=1"]);
        // Three-week window over a Monday-only schedule.
        let past = utc(2024, 1, 1, 0, 0);
        let now = utc(2024, 1, 21, 23, 59);
        let events = collect_events(&objects, past, now, Tz::UTC);

        assert_eq!(events.len(), 3);
        let mut times: Vec<DateTime<Utc>> = events.iter().map(|e| e.at).collect();
        times.dedup();
        assert_eq!(times.len(), 3);
    }

    #[test]
    fn empty_window_produces_nothing() {
        let objects = snapshot(&["mon-fri 8:00 replicas=1"]);
        let past = utc(2024, 1, 1, 9, 0);
        let now = utc(2024, 1, 1, 9, 0);
        assert!(collect_events(&objects, past, now, Tz::UTC).is_empty());
    }

    #[test]
    fn schedule_in_other_time_zone_lands_in_window() {
        let objects = snapshot(&["mon 8:00 replicas=1"]);
        let tz: Tz = "Europe/Amsterdam".parse().unwrap();
        // 08:00 Amsterdam == 07:00 UTC in winter.
        let past = utc(2024, 1, 1, 6, 0);
        let now = utc(2024, 1, 1, 7, 30);
        let events = collect_events(&objects, past, now, tz);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].at, utc(2024, 1, 1, 7, 0));
    }
}
