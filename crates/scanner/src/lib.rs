//! Workload discovery contract.
//!
//! A scanner discovers scalable workloads in some scope (a namespace, a
//! label selector) and knows how to list, scale, persist state on, and watch
//! them. One scanner implementation exists per workload kind; this crate
//! defines the contract and the shared object model, not the cluster-API
//! plumbing behind it.

mod annotation;
mod config;
mod error;
mod factory;
mod object;
mod scanner;

pub use annotation::{
    saved_state_annotation, saved_state_from_annotations, schedules_from_annotations,
    IGNORE_ANNOTATION, RESTORE_ANNOTATION, SCHEDULE_ANNOTATION,
};
pub use config::ScannerConfig;
pub use error::ScanError;
pub use factory::{ScannerFactories, ScannerFactory};
pub use object::{Object, SavedState};
pub use scanner::{Scanner, WatchEvent};
