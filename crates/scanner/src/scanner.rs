use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::config::ScannerConfig;
use crate::error::ScanError;
use crate::object::Object;

/// A live change observed on a scanner's workloads.
///
/// `Lost` is the reconnect sentinel: the underlying event source broke and
/// the consumer should re-subscribe. A scanner that can detect the break
/// itself sends `Lost` before closing the channel; a silently closed channel
/// is treated the same way.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    Add(Object),
    Update(Object),
    Remove(Object),
    Lost(String),
}

/// Contract for workload discovery backends, one per workload kind.
///
/// Implementations wrap the cluster-API specifics of listing, scaling and
/// watching a particular resource type. All persistence of saved state
/// happens behind this trait (e.g. as metadata on the workload itself).
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Apply the scope configuration. Called once, before the scanner is
    /// registered with the agent.
    fn set_config(&mut self, cfg: ScannerConfig);

    fn config(&self) -> &ScannerConfig;

    /// Full listing of the configured scope. Only workloads with a
    /// non-empty resolved schedule list are returned.
    async fn get_objects(&self) -> Result<Vec<Object>, ScanError>;

    /// Persist the workload's current replica count (to be restored later
    /// by a `state=restore` schedule) and return the persisted value.
    async fn save_state(&self, obj: &Object) -> Result<i32, ScanError>;

    /// Apply a new replica count to the workload.
    async fn scale(&self, obj: &Object, replicas: i32) -> Result<(), ScanError>;

    /// Begin streaming watch events for the configured scope.
    ///
    /// The scanner must observe `stop` and, once it flips to `true`, release
    /// its underlying resources and close the channel; the closed channel
    /// is the stop acknowledgment the consumer waits for.
    async fn watch(
        &self,
        stop: watch::Receiver<bool>,
    ) -> Result<mpsc::Receiver<WatchEvent>, ScanError>;
}
