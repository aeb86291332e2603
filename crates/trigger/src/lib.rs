//! Side-effect hooks fired on schedule transitions.
//!
//! A trigger is a named action (e.g. a webhook call) executed when schedules
//! referencing it are processed in a scale tick. A keepalive is the inverse
//! probe: a hook the agent consults to decide whether a scale-down should be
//! postponed because the workload is still in use.

mod error;
mod factory;
pub mod template;
mod traits;
mod webhook;

pub use error::TriggerError;
pub use factory::{KeepAliveFactories, KeepAliveFactory, TriggerFactories, TriggerFactory};
pub use traits::{KeepAlive, Trigger, TriggerConfig};
pub use webhook::{WebhookKeepAlive, WebhookTrigger};
