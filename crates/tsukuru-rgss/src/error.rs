//! Error types for the RGSS crate.

use thiserror::Error;

/// Failures opening, reading or extracting an RGSS archive.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error (bad magic, truncation).
    #[error("{0}")]
    Common(#[from] tsukuru_common::Error),

    /// Header magic matched but the version byte is not one we can read.
    #[error("unsupported archive version: {0}")]
    UnsupportedVersion(u8),

    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// Entry name would escape the extraction directory.
    #[error("refusing to extract unsafe path: {0}")]
    UnsafePath(String),
}

/// Result type for RGSS operations.
pub type Result<T> = std::result::Result<T, Error>;
