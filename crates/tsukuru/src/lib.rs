//! Tsukuru - RPG Maker project data ingestion library.
//!
//! This crate ties the Tsukuru crates together: it discovers a game
//! directory, decodes its database and maps, interprets event commands and
//! builds the cross-referenced catalog, then publishes the result as one
//! immutable [`ProjectView`].
//!
//! # Crates
//!
//! - [`tsukuru_common`] - Binary reading, byte sources, text decoding, warnings
//! - [`tsukuru_rgss`] - RGSS archives (`.rgssad`, `.rgss2a`, `.rgss3a`)
//! - [`tsukuru_crypt`] - MV/MZ resource de-obfuscation and decrypted-resource cache
//! - [`tsukuru_marshal`] - Ruby Marshal object graphs
//! - [`tsukuru_data`] - Engine discovery and the unified data model
//! - [`tsukuru_event`] - Event command interpretation
//! - [`tsukuru_catalog`] - Name resolution and the browsable catalog
//!
//! # Example
//!
//! ```no_run
//! use tsukuru::prelude::*;
//!
//! let session = Session::load("path/to/game", &LoadOptions::new())?;
//! let view = session.view();
//! println!("{} ({})", view.title(), view.engine());
//!
//! if let Some(page) = view.page_instructions(1, 3, 1) {
//!     for instruction in &page.instructions {
//!         println!("{}{}", "  ".repeat(instruction.indent.max(0) as usize), instruction.text);
//!     }
//! }
//! # Ok::<(), tsukuru::Error>(())
//! ```

mod error;
mod host;
mod options;
mod session;

pub use error::{Error, Result};
pub use host::{Reload, SessionHost};
pub use options::{LoadOptions, DEFAULT_CACHE_DIR};
pub use session::{ProjectView, Session};

// Re-export all sub-crates
pub use tsukuru_catalog as catalog;
pub use tsukuru_common as common;
pub use tsukuru_crypt as crypt;
pub use tsukuru_data as data;
pub use tsukuru_event as event;
pub use tsukuru_marshal as marshal;
pub use tsukuru_rgss as rgss;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{LoadOptions, ProjectView, Reload, Session, SessionHost};
    pub use tsukuru_catalog::{Catalog, CatalogEntry, Passability, Resolution, ResolvedReference};
    pub use tsukuru_common::{Loaded, Warning, WarningKind, Warnings};
    pub use tsukuru_crypt::{KeyState, PrepareReport, PrepareStatus, ResourceCache};
    pub use tsukuru_data::{Engine, Project, ProjectHandle, RefKind, Reference};
    pub use tsukuru_event::{EventAnalysis, Instruction, PageAnalysis, Style};
    pub use tsukuru_rgss::{RgssArchive, RgssEntry};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
