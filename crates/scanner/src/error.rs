use thiserror::Error;

use lightsout_schedule::ScheduleError;

/// Errors surfaced by scanner implementations and the shared helpers.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid scanner type: {0}")]
    UnknownType(String),

    #[error("invalid schedule annotation: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("invalid value '{0}' for annotation {1}")]
    InvalidAnnotation(String, &'static str),

    #[error("watch unavailable: {0}")]
    Watch(String),

    #[error("{0}")]
    Backend(String),
}
