use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Operational counters kept by the agent, snapshotted for observability.
///
/// Exporting these (Prometheus or otherwise) is left to whatever embeds the
/// agent; the agent only counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentMetrics {
    /// Completed scale ticks.
    pub ticks: u64,
    /// Successful scale operations.
    pub scale_ops: u64,
    /// Failed scale or save-state operations.
    pub scale_errors: u64,
    /// Failed trigger executions.
    pub trigger_errors: u64,
    /// Last applied replica count per `namespace/name`.
    pub replicas: HashMap<String, i32>,
    /// Timestamp of the last completed tick.
    pub last_tick: Option<DateTime<Utc>>,
}

impl AgentMetrics {
    pub fn record_tick(&mut self, at: DateTime<Utc>) {
        self.ticks += 1;
        self.last_tick = Some(at);
    }

    pub fn record_scale(&mut self, namespace: &str, name: &str, replicas: i32) {
        self.scale_ops += 1;
        self.replicas.insert(format!("{namespace}/{name}"), replicas);
    }

    pub fn record_scale_error(&mut self) {
        self.scale_errors += 1;
    }

    pub fn record_trigger_error(&mut self) {
        self.trigger_errors += 1;
    }
}
