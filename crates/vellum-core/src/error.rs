//! Core error types.

use thiserror::Error;

/// Core change bus errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The dispatch worker thread could not be spawned.
    #[error("failed to spawn dispatch worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// Invalid bus configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
