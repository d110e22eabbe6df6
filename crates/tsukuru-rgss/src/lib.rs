//! RGSSAD archive reader for RPG Maker XP/VX/VX Ace games.
//!
//! The legacy engines bundle their `Data/` and `Graphics/` folders into a single
//! obfuscated container (`Game.rgssad`, `Game.rgss2a`, `Game.rgss3a`). Two
//! directory layouts exist:
//!
//! - **Sequential** (versions 1 and 2): every directory field is XORed with a
//!   running key that advances once per integer and once per name byte. Payloads
//!   sit inline between directory records, so the directory can only be walked
//!   front to back.
//! - **Seeded** (version 3): a per-archive seed masks a compact directory at the
//!   start of the file; payloads follow it.
//!
//! In both layouts each entry records the key its payload was encoded with, so
//! any entry can be decoded on its own once the directory is known.
//!
//! Corrupt directory records (zero length, past the end of the file, overlapping
//! another entry) are dropped and reported through [`RgssArchive::warnings`]
//! instead of failing the whole archive.
//!
//! # Example
//!
//! ```no_run
//! use tsukuru_rgss::RgssArchive;
//!
//! let archive = RgssArchive::open("Game.rgss3a")?;
//!
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.name(), entry.size());
//! }
//!
//! // Lookups ignore case and path separator style.
//! let map_infos = archive.read_entry("data/mapinfos.rvdata2")?;
//! # Ok::<(), tsukuru_rgss::Error>(())
//! ```

mod archive;
mod crypto;
mod entry;
mod error;
mod source;

pub use archive::{ArchiveVersion, RgssArchive, MAGIC};
pub use crypto::{decrypt_payload, KeyStream, SEED};
pub use entry::{canonical_name, RgssEntry};
pub use error::{Error, Result};
pub use source::ArchiveEntrySource;
