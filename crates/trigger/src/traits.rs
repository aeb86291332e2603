use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use lightsout_scanner::Object;

use crate::error::TriggerError;

/// Configuration for a trigger or keepalive instance.
///
/// `settings` is a free-form map interpreted by the implementation (for the
/// webhook flavor: `url`, `method`, `timeout`, `body`). Keys are expected
/// lowercase.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TriggerConfig {
    /// Id schedules refer to via `trigger=` / `keepalive=`.
    pub id: String,
    /// Implementation type, matching the factory registration name.
    pub kind: String,
    pub settings: HashMap<String, String>,
}

/// A named side effect executed when schedules referencing it fire.
///
/// Executions are serialized by the dispatcher; implementations never run
/// concurrently with each other and may safely hit rate-limited endpoints.
#[async_trait]
pub trait Trigger: Send + Sync {
    fn set_config(&mut self, cfg: TriggerConfig);

    fn config(&self) -> &TriggerConfig;

    /// Run the side effect for the workloads whose schedules named this
    /// trigger during one tick.
    async fn execute(&self, objects: &[Object]) -> Result<(), TriggerError>;
}

/// A liveness probe consulted before scaling down.
///
/// A successful execution means the guarded service is still in use and the
/// scale event should be postponed.
#[async_trait]
pub trait KeepAlive: Send + Sync {
    fn set_config(&mut self, cfg: TriggerConfig);

    fn config(&self) -> &TriggerConfig;

    async fn execute(&self) -> Result<(), TriggerError>;
}
