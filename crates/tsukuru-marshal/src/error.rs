//! Error types for Marshal parsing.

use thiserror::Error;

/// Errors that can occur when parsing Marshal data.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error (bad version header, truncation).
    #[error("{0}")]
    Common(#[from] tsukuru_common::Error),

    /// Type tag this reader does not understand.
    #[error("unknown type tag {tag:#04x} at offset {position}")]
    UnknownTag { tag: u8, position: usize },

    /// Symbol or object link to an index that was never defined.
    #[error("{kind} link {index} out of range")]
    BadLink { kind: &'static str, index: i64 },

    /// Nesting deeper than [`MAX_DEPTH`](crate::MAX_DEPTH).
    #[error("nesting deeper than {0} levels")]
    DepthExceeded(usize),

    /// Structurally invalid value (negative length, malformed user type).
    #[error("invalid data at offset {position}: {message}")]
    Invalid { position: usize, message: String },
}

impl Error {
    /// Whether the input simply ended early.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::Common(e) if e.is_truncation())
    }
}

/// Result type for Marshal operations.
pub type Result<T> = std::result::Result<T, Error>;
