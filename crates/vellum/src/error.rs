//! Repository error types.

use thiserror::Error;

/// Repository errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Change bus error.
    #[error("change bus error: {0}")]
    Core(#[from] vellum_core::Error),

    /// The repository has been shut down.
    #[error("repository is not running")]
    NotRunning,

    /// The named workspace does not exist.
    #[error("no such workspace: {0}")]
    NoSuchWorkspace(String),

    /// Configuration or argument error.
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// Unrecognized permission action.
    #[error("unknown permission action: {0}")]
    UnknownPermission(String),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, Error>;
