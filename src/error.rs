//! Error types shared by the engine, storage and HTTP layers

use thiserror::Error;

/// Failures reported by a key-value backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by panel operations
#[derive(Debug, Error)]
pub enum PanelError {
    /// Countdown timers need a positive duration
    #[error("Countdown duration must be greater than zero")]
    InvalidDuration,

    #[error("Failed to lock panel state: {0}")]
    Lock(String),
}

pub type PanelResult<T> = Result<T, PanelError>;
