//! Deduplicated, serialized execution of schedule triggers.
//!
//! Every scale tick accumulates the trigger ids touched by its events into
//! per-id batches, then enqueues the batches on a bounded queue. A single
//! worker drains the queue in order, so triggers with side effects never run
//! concurrently with each other and a slow trigger can never delay the next
//! scale tick, only its fellow queue entries.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use lightsout_scanner::Object;
use lightsout_trigger::Trigger;

use crate::metrics::AgentMetrics;

/// One queue entry: a trigger id and the workloads whose schedules named it
/// during a single tick.
#[derive(Debug, Clone)]
pub struct TriggerBatch {
    pub id: String,
    pub objects: Vec<Object>,
}

/// Fold `ids` for `obj` into the tick's batch list.
///
/// First-seen order is preserved for both ids and objects; an id seen again
/// only appends the object to its existing batch.
pub(crate) fn accumulate(batches: &mut Vec<TriggerBatch>, obj: &Object, ids: &[String]) {
    for id in ids {
        match batches.iter_mut().find(|batch| batch.id == *id) {
            Some(batch) => batch.objects.push(obj.clone()),
            None => batches.push(TriggerBatch {
                id: id.clone(),
                objects: vec![obj.clone()],
            }),
        }
    }
}

/// Handle for feeding the serialized trigger queue.
///
/// Dropping the handle closes the queue; the worker drains what is left and
/// exits.
pub(crate) struct TriggerDispatcher {
    tx: mpsc::Sender<TriggerBatch>,
}

impl TriggerDispatcher {
    /// Spawn the single worker and return the feeding handle alongside the
    /// worker's join handle.
    pub(crate) fn start(
        triggers: HashMap<String, Arc<dyn Trigger>>,
        capacity: usize,
        metrics: Arc<RwLock<AgentMetrics>>,
    ) -> (TriggerDispatcher, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<TriggerBatch>(capacity);

        let worker = tokio::spawn(async move {
            while let Some(batch) = rx.recv().await {
                let Some(trigger) = triggers.get(&batch.id) else {
                    warn!(id = %batch.id, "no trigger configured for id, skipping");
                    continue;
                };
                match trigger.execute(&batch.objects).await {
                    Ok(()) => {
                        debug!(id = %batch.id, objects = batch.objects.len(), "trigger executed");
                    }
                    Err(e) => {
                        error!(id = %batch.id, error = %e, "trigger execution failed");
                        metrics.write().unwrap().record_trigger_error();
                    }
                }
            }
            debug!("trigger queue closed, worker exiting");
        });

        (TriggerDispatcher { tx }, worker)
    }

    /// Push a tick's batches onto the queue, in accumulation order.
    ///
    /// A full queue blocks the caller instead of dropping batches.
    pub(crate) async fn enqueue(&self, batches: Vec<TriggerBatch>) {
        for batch in batches {
            if self.tx.send(batch).await.is_err() {
                warn!("trigger queue is closed, dropping remaining batches");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use lightsout_scanner::ScannerConfig;

    use super::*;

    fn object(name: &str) -> Object {
        let mut obj = Object::for_scanner(&ScannerConfig::default());
        obj.uid = format!("uid-{name}");
        obj.name = name.into();
        obj
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn accumulate_deduplicates_ids_preserving_order() {
        let mut batches = Vec::new();
        accumulate(&mut batches, &object("one"), &ids(&["t1"]));
        accumulate(&mut batches, &object("two"), &ids(&["t2", "t3"]));
        accumulate(&mut batches, &object("three"), &ids(&["t1"]));

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].id, "t1");
        assert_eq!(batches[1].id, "t2");
        assert_eq!(batches[2].id, "t3");

        let names: Vec<&str> = batches[0].objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["one", "three"]);
    }

    #[test]
    fn accumulate_without_ids_adds_nothing() {
        let mut batches = Vec::new();
        accumulate(&mut batches, &object("one"), &[]);
        assert!(batches.is_empty());
    }
}
