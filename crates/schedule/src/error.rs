use thiserror::Error;

/// Errors produced while parsing or evaluating a schedule rule.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("incomplete schedule '{0}', expected '<weekdays> <HH:MM> [key=value ..]'")]
    Incomplete(String),

    #[error("invalid weekday: {0}")]
    InvalidWeekday(String),

    #[error("invalid day range: {0}")]
    InvalidDayRange(String),

    #[error("invalid hour: {0}")]
    InvalidHour(String),

    #[error("invalid minute: {0}")]
    InvalidMinute(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("replicas definition not found in schedule")]
    MissingReplicas,

    #[error("invalid replicas value: {0}")]
    InvalidReplicas(String),

    #[error("invalid state value: {0}")]
    InvalidState(String),

    #[error("can't find next trigger for schedule '{0}'")]
    NoNextTrigger(String),
}
