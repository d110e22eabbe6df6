//! Error types for tsukuru-common.

use thiserror::Error;

use crate::WarningKind;

/// Common error type for Tsukuru operations.
///
/// The format variants are shared by every reader in the workspace so that
/// callers can tell "not this format at all" apart from "this format, but cut short".
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// The input does not start with the expected signature.
    #[error("bad magic: expected {expected:02x?}, got {actual:02x?}")]
    BadMagic { expected: Vec<u8>, actual: Vec<u8> },

    /// The signature matched but the decoded header is not plausible.
    #[error("bad header: {0}")]
    BadHeader(String),

    /// A declared size runs past the bytes that are actually available.
    #[error("{what}: declared {declared} bytes but only {available} available")]
    Truncated {
        what: String,
        declared: u64,
        available: u64,
    },

    /// Structurally invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a truncation error.
    pub fn truncated(what: impl Into<String>, declared: u64, available: u64) -> Self {
        Self::Truncated {
            what: what.into(),
            declared,
            available,
        }
    }

    /// Whether this error means the input ended early.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. } | Self::Truncated { .. })
    }

    /// The warning category this error becomes when it is recovered from.
    pub fn warning_kind(&self) -> WarningKind {
        match self {
            Self::UnexpectedEof { .. } | Self::Truncated { .. } => WarningKind::Truncated,
            Self::BadMagic { .. } | Self::BadHeader(_) | Self::InvalidData(_) => WarningKind::Format,
            Self::Io(_) => WarningKind::Io,
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_kinds() {
        let eof = Error::UnexpectedEof {
            needed: 4,
            available: 1,
        };
        assert!(eof.is_truncation());
        assert_eq!(eof.warning_kind(), WarningKind::Truncated);

        let magic = Error::BadMagic {
            expected: b"RGSSAD".to_vec(),
            actual: b"PK\x03\x04\0\0".to_vec(),
        };
        assert!(!magic.is_truncation());
        assert_eq!(magic.warning_kind(), WarningKind::Format);
    }
}
