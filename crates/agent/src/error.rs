use thiserror::Error;

/// Agent lifecycle errors.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("agent is already running")]
    AlreadyStarted,
}
