//! Common utilities for Tsukuru.
//!
//! Pieces every other Tsukuru crate leans on:
//!
//! - [`BinaryReader`] - Little-endian cursor over borrowed bytes
//! - [`ByteSource`] - Uniform random access over loose files, memory and archive entries
//! - [`text`] - Decoding of project text that may be UTF-8 or Shift_JIS
//! - [`Warnings`] - Collected recoverable conditions returned next to loaded data
//! - [`hash`] - CRC32C fingerprints used to address cached files

mod error;
mod reader;
mod source;
mod warning;

pub mod hash;
pub mod text;

pub use error::{Error, Result};
pub use reader::BinaryReader;
pub use source::{ByteSource, MappedFile, MemorySource};
pub use warning::{Loaded, Warning, WarningKind, Warnings};
