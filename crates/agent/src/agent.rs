//! Agent assembly and lifecycle.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use lightsout_scanner::{Object, Scanner};
use lightsout_trigger::{KeepAlive, Trigger};

use crate::dispatch::TriggerDispatcher;
use crate::error::AgentError;
use crate::metrics::AgentMetrics;
use crate::registry::ObjectRegistry;
use crate::scale::ScaleProcessor;
use crate::watch::{resync_loop, watch_scanner};

/// Tunables for one agent instance.
///
/// All schedule times, configured and annotated alike, are interpreted in
/// `time_zone`.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub time_zone: Tz,
    /// Interval between scale ticks.
    pub scale_interval: Duration,
    /// Interval between full re-listings of every scanner.
    pub resync_interval: Duration,
    /// Bound on the trigger queue; a full queue blocks the tick that is
    /// enqueuing rather than dropping triggers.
    pub trigger_queue_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> AgentConfig {
        AgentConfig {
            time_zone: Tz::UTC,
            scale_interval: Duration::from_secs(30),
            resync_interval: Duration::from_secs(15 * 60),
            trigger_queue_capacity: 64,
        }
    }
}

/// Handles held while the agent's tasks are running.
struct Running {
    stop_watchers: watch::Sender<bool>,
    stop_loops: watch::Sender<bool>,
    watchers: Vec<JoinHandle<()>>,
    loops: Vec<JoinHandle<()>>,
    trigger_worker: JoinHandle<()>,
}

/// The composition root: owns the registry, the configured scanners,
/// triggers and keepalives, and the timers driving them.
///
/// Constructed explicitly and passed wherever it is needed; there is no
/// process-wide instance. A single agent instance is assumed per managed
/// scope.
pub struct Agent {
    config: AgentConfig,
    registry: Arc<ObjectRegistry>,
    scanners: Vec<Arc<dyn Scanner>>,
    triggers: HashMap<String, Arc<dyn Trigger>>,
    keepalives: HashMap<String, Arc<dyn KeepAlive>>,
    metrics: Arc<RwLock<AgentMetrics>>,
    running: Option<Running>,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Agent {
        Agent {
            config,
            registry: Arc::new(ObjectRegistry::new()),
            scanners: Vec::new(),
            triggers: HashMap::new(),
            keepalives: HashMap::new(),
            metrics: Arc::new(RwLock::new(AgentMetrics::default())),
            running: None,
        }
    }

    /// Register a configured scanner. Registration order matters to the
    /// caller only through the priorities it assigned in the scanners'
    /// configs; the registry resolves conflicts by those.
    pub fn add_scanner(&mut self, scanner: Box<dyn Scanner>) {
        self.scanners.push(Arc::from(scanner));
    }

    /// Register a trigger under its configured id (lowercased).
    pub fn add_trigger(&mut self, trigger: Box<dyn Trigger>) {
        let id = trigger.config().id.to_lowercase();
        self.triggers.insert(id, Arc::from(trigger));
    }

    /// Register a keepalive hook under its configured id (lowercased).
    pub fn add_keep_alive(&mut self, keepalive: Box<dyn KeepAlive>) {
        let id = keepalive.config().id.to_lowercase();
        self.keepalives.insert(id, Arc::from(keepalive));
    }

    /// The current resolved view of all discovered workloads.
    pub fn objects(&self) -> HashMap<String, Object> {
        self.registry.get_objects()
    }

    pub fn registry(&self) -> Arc<ObjectRegistry> {
        Arc::clone(&self.registry)
    }

    /// Snapshot of the operational counters.
    pub fn metrics(&self) -> AgentMetrics {
        self.metrics.read().unwrap().clone()
    }

    /// Spawn the agent's tasks: one watcher per scanner, the resync loop,
    /// the scale loop, and the trigger worker.
    pub fn start(&mut self) -> Result<(), AgentError> {
        if self.running.is_some() {
            return Err(AgentError::AlreadyStarted);
        }
        info!(
            scanners = self.scanners.len(),
            triggers = self.triggers.len(),
            keepalives = self.keepalives.len(),
            "starting agent"
        );

        let (stop_watchers, watch_stop_rx) = watch::channel(false);
        let (stop_loops, loop_stop_rx) = watch::channel(false);

        let watchers = self
            .scanners
            .iter()
            .map(|scanner| {
                tokio::spawn(watch_scanner(
                    Arc::clone(scanner),
                    Arc::clone(&self.registry),
                    watch_stop_rx.clone(),
                ))
            })
            .collect();

        let resync = tokio::spawn(resync_loop(
            self.scanners.clone(),
            Arc::clone(&self.registry),
            self.config.resync_interval,
            loop_stop_rx.clone(),
        ));

        // First scanner registered for a kind scales that kind's workloads.
        let mut scalers: HashMap<String, Arc<dyn Scanner>> = HashMap::new();
        for scanner in &self.scanners {
            scalers
                .entry(scanner.config().kind.clone())
                .or_insert_with(|| Arc::clone(scanner));
        }

        let (dispatcher, trigger_worker) = TriggerDispatcher::start(
            self.triggers.clone(),
            self.config.trigger_queue_capacity,
            Arc::clone(&self.metrics),
        );

        let mut processor = ScaleProcessor::new(
            Arc::clone(&self.registry),
            scalers,
            self.keepalives.clone(),
            Arc::clone(&self.metrics),
            self.config.time_zone,
        );
        let scale_interval = self.config.scale_interval;
        let mut scale_stop = loop_stop_rx;
        let scale = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(scale_interval) => {
                        let batches = processor.tick(Utc::now()).await;
                        dispatcher.enqueue(batches).await;
                    }
                    changed = scale_stop.changed() => {
                        if changed.is_err() || *scale_stop.borrow() {
                            // Dropping the dispatcher closes the trigger
                            // queue; the worker drains and exits.
                            return;
                        }
                    }
                }
            }
        });

        self.running = Some(Running {
            stop_watchers,
            stop_loops,
            watchers,
            loops: vec![resync, scale],
            trigger_worker,
        });
        Ok(())
    }

    /// Stop all tasks: watchers first (waiting for each scanner's stop
    /// acknowledgment), then the scale and resync loops, then the trigger
    /// queue once it has drained.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        info!("stopping agent");

        let _ = running.stop_watchers.send(true);
        for watcher in running.watchers {
            if let Err(e) = watcher.await {
                warn!(error = %e, "watcher task failed during shutdown");
            }
        }

        let _ = running.stop_loops.send(true);
        for task in running.loops {
            if let Err(e) = task.await {
                warn!(error = %e, "agent loop failed during shutdown");
            }
        }

        if let Err(e) = running.trigger_worker.await {
            warn!(error = %e, "trigger worker failed during shutdown");
        }
        info!("agent stopped");
    }
}
