//! Driver errors.

use thiserror::Error;

/// Errors that end a driver run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("repository error: {0}")]
    Repository(#[from] vellum::Error),

    #[error("a publisher thread panicked")]
    PublisherPanicked,

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
