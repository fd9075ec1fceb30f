use mote_relay::RelayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("task failed: {0}")]
    Task(String),

    #[error("{outstanding} receive buffers were never released")]
    Leak { outstanding: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tokio::task::JoinError> for SimError {
    fn from(e: tokio::task::JoinError) -> Self {
        SimError::Task(e.to_string())
    }
}
