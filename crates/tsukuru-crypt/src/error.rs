//! Error types for the crypt crate.

use thiserror::Error;

use crate::KeyError;

/// Failures decrypting a resource or writing it to the cache.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error (bad magic, bad header, truncation).
    #[error("{0}")]
    Common(#[from] tsukuru_common::Error),

    /// The project key is missing or malformed.
    #[error("resource key unavailable: {0}")]
    Key(#[from] KeyError),

    /// A cache path would leave the cache directory.
    #[error("refusing to cache unsafe path: {0}")]
    UnsafePath(String),
}

impl Error {
    /// The warning category this error becomes when it is recovered from.
    pub fn warning_kind(&self) -> tsukuru_common::WarningKind {
        match self {
            Self::Io(_) => tsukuru_common::WarningKind::Io,
            Self::Common(e) => e.warning_kind(),
            Self::Key(_) => tsukuru_common::WarningKind::Key,
            Self::UnsafePath(_) => tsukuru_common::WarningKind::Format,
        }
    }
}

/// Result type for crypt operations.
pub type Result<T> = std::result::Result<T, Error>;
