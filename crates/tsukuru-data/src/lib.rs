//! Unified RPG Maker project model.
//!
//! Four engine generations store the same kind of database in two
//! serializations: MV and MZ write one JSON file per collection, VX and VX Ace
//! write Ruby Marshal graphs, either loose under `Data/` or packed in an RGSS
//! archive. This crate discovers which one a directory holds and decodes it
//! into a single set of records.
//!
//! Loading is tolerant: a bad record, event or map becomes a warning next to
//! the result, and only a missing map index or a data file of the wrong shape
//! fails the load.
//!
//! # Example
//!
//! ```no_run
//! use tsukuru_data::{load_project, ProjectHandle};
//!
//! let handle = ProjectHandle::open("path/to/game".as_ref())?;
//! let loaded = load_project(&handle)?;
//! for warning in &loaded.warnings {
//!     eprintln!("{warning}");
//! }
//! println!("{} maps", loaded.value.maps.len());
//! # Ok::<(), tsukuru_data::Error>(())
//! ```

mod database;
mod decode;
mod engine;
mod error;
mod handle;
mod id_table;
mod project;
mod tree;

pub mod model;
pub mod reference;

pub use database::Database;
pub use decode::SchemaDecoder;
pub use engine::{discover, discover_as, Discovery, Engine};
pub use error::{Error, Result};
pub use handle::{DataFile, ProjectHandle};
pub use id_table::IdTable;
pub use project::{load_project, Project};
pub use reference::{NameLookup, RefKind, Reference};
pub use tree::{MapTree, TreeRow, ROOT_ID};
