//! Resource decryption for RPG Maker MV/MZ games.
//!
//! MV and MZ deployments can obfuscate images and audio. An obfuscated file is
//! a 16-byte signature block followed by the original file, whose first 16
//! bytes have been XORed with the project key. The key is a hex string stored
//! as `encryptionKey` in `data/System.json`.
//!
//! | Encrypted extension | Original |
//! |---------------------|----------|
//! | `.rpgmvp`, `.png_`  | `.png`   |
//! | `.rpgmvo`, `.ogg_`  | `.ogg`   |
//! | `.rpgmvm`, `.m4a_`  | `.m4a`   |
//!
//! A missing or malformed key is not an error for the project: it yields
//! [`KeyState::Unavailable`] and callers show placeholders instead.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use tsukuru_crypt::{prepare_resources, KeyState, ResourceCache};
//!
//! let root = Path::new("MyGame/www");
//! let key = KeyState::from_system_json(&std::fs::read(root.join("data/System.json"))?);
//! let cache = ResourceCache::new(root.join("cache/decrypted"));
//!
//! let report = prepare_resources(root, &key, &cache);
//! println!("{:?}: {} written, {} failed", report.status, report.written, report.failed);
//! # Ok::<(), std::io::Error>(())
//! ```

mod cache;
mod decrypt;
mod error;
mod key;
mod prepare;

pub use cache::{ResourceCache, StoreOutcome};
pub use decrypt::{decrypt, decrypted_path, encrypt, xor_head, AssetKind, SIGNATURE, SIGNATURE_LEN, XOR_LEN};
pub use error::{Error, Result};
pub use key::{KeyError, KeyState, ResourceKey};
pub use prepare::{find_encrypted_resources, prepare_resources, prepare_resources_with, PrepareReport, PrepareStatus};
