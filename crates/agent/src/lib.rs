//! The reconciliation agent.
//!
//! Ties the pieces together: scanners feed discovered workloads into the
//! [`ObjectRegistry`] (live watch events plus a periodic full resync), the
//! scale processor derives and applies the schedule transitions that fell
//! due since its last tick, and side-effect triggers are dispatched through
//! a serialized queue so they never overlap.

mod agent;
mod delay;
mod dispatch;
mod error;
mod metrics;
mod registry;
mod scale;
mod watch;


pub use agent::{Agent, AgentConfig};
pub use dispatch::TriggerBatch;
pub use error::AgentError;
pub use metrics::AgentMetrics;
pub use registry::ObjectRegistry;
