use thiserror::Error;

/// Errors from trigger and keepalive execution.
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("invalid trigger type: {0}")]
    UnknownType(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("template rendering failed: {0}")]
    Template(String),
}
