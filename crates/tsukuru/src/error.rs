//! Error types for loading a session.

use thiserror::Error;

/// Errors that stop a project from being published.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Data(#[from] tsukuru_data::Error),

    #[error(transparent)]
    Common(#[from] tsukuru_common::Error),

    /// The worker pool for a sequential load could not be started.
    #[error("thread pool: {0}")]
    ThreadPool(String),
}

/// Result type for session loading.
pub type Result<T> = std::result::Result<T, Error>;
