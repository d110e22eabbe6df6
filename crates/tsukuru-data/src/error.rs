//! Error types for project loading.

use std::path::PathBuf;

use thiserror::Error;
use tsukuru_common::WarningKind;

/// Errors that can occur while opening or decoding a project.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error (format, truncation, I/O).
    #[error("{0}")]
    Common(#[from] tsukuru_common::Error),

    #[error("archive: {0}")]
    Archive(#[from] tsukuru_rgss::Error),

    #[error("marshal: {0}")]
    Marshal(#[from] tsukuru_marshal::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record decoded but breaks an invariant, or a root has the wrong shape.
    #[error("{context}: {message}")]
    Schema { context: String, message: String },

    /// Nothing at the path looks like a supported project.
    #[error("no RPG Maker project found at {0}")]
    NotAProject(PathBuf),

    /// A data file the project cannot load without is absent.
    #[error("required data file {0} is missing")]
    MissingRoot(String),
}

impl Error {
    pub fn schema(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            context: context.into(),
            message: message.into(),
        }
    }

    /// The warning category this error becomes when it is recovered from.
    pub fn warning_kind(&self) -> WarningKind {
        match self {
            Self::Common(e) => e.warning_kind(),
            Self::Archive(tsukuru_rgss::Error::Common(e)) => e.warning_kind(),
            Self::Marshal(e) if e.is_truncation() => WarningKind::Truncated,
            Self::Archive(_) | Self::Marshal(_) | Self::Json(_) => WarningKind::Format,
            Self::Io(_) | Self::MissingRoot(_) | Self::NotAProject(_) => WarningKind::Io,
            Self::Schema { .. } => WarningKind::Schema,
        }
    }
}

/// Result type for project loading.
pub type Result<T> = std::result::Result<T, Error>;
