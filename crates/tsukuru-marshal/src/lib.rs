//! Ruby Marshal reader for RPG Maker VX and VX Ace data files.
//!
//! The legacy engines store their database (`Data/*.rvdata`, `*.rvdata2`) as
//! Ruby Marshal 4.8 object graphs: `RPG::Map`, `RPG::Event`, `RPG::Item` and so
//! on, with instance variables named `@like_this`. This crate turns those bytes
//! into a plain [`Value`] tree that the schema decoders walk.
//!
//! Supported:
//!
//! - nil, booleans, fixnums, bignums, floats
//! - strings (with encoding ivars), symbols and symbol links
//! - arrays, hashes (with or without default), objects, structs
//! - `_dump` user types ([`Table`], `Color`, `Tone`), `marshal_load` user types
//! - object links, class/module references, regexps, extended and subclassed values
//!
//! Object links to values still being read (cycles) resolve to nil.
//!
//! # Example
//!
//! ```
//! use tsukuru_marshal::{from_bytes, Value};
//!
//! // [1, "two", :three]
//! let data = b"\x04\x08[\x08i\x06I\"\x08two\x06:\x06ET:\x0athree";
//! let value = from_bytes(data)?;
//!
//! let items = value.as_array().unwrap();
//! assert_eq!(items[0].as_i64(), Some(1));
//! assert_eq!(items[1].as_str().as_deref(), Some("two"));
//! assert_eq!(items[2], Value::Symbol("three".into()));
//! # Ok::<(), tsukuru_marshal::Error>(())
//! ```

mod error;
mod parser;
mod table;
mod value;

#[cfg(any(test, feature = "test-util"))]
pub mod writer;

pub use error::{Error, Result};
pub use parser::{from_bytes, MAX_DEPTH};
pub use table::Table;
pub use value::{Object, UserDef, Value};
