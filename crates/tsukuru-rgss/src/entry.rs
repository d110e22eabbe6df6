//! Directory records of RGSS archives.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Canonical lookup form of an entry name.
///
/// Archives store Windows paths with inconsistent casing; lookups normalize
/// separators to `\`, trim surrounding whitespace and lowercase.
///
/// ```
/// assert_eq!(tsukuru_rgss::canonical_name(" Data/MapInfos.rvdata2 "), r"data\mapinfos.rvdata2");
/// ```
pub fn canonical_name(name: &str) -> String {
    name.trim().replace('/', "\\").to_lowercase()
}

/// Directory record of one file in an RGSS archive.
///
/// Payload bytes are not held here; use [`RgssArchive::read`](crate::RgssArchive::read) to get the decoded contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgssEntry {
    /// Name as stored in the archive, with `/` normalized to `\`.
    name: String,
    /// Absolute offset of the payload in the archive file.
    offset: u64,
    /// Payload size; encoded and decoded sizes are equal.
    size: u32,
    /// Key the payload stream starts from.
    key: u32,
}

impl RgssEntry {
    pub(crate) fn new(name: String, offset: u64, size: u32, key: u32) -> Self {
        Self {
            name: name.trim().replace('/', "\\"),
            offset,
            size,
            key,
        }
    }

    /// Stored name, `\`-separated.
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Key the payload stream starts from.
    pub fn key(&self) -> u32 {
        self.key
    }

    /// End of the payload (exclusive).
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.size)
    }

    /// Lookup form of the name.
    pub fn canonical_name(&self) -> String {
        canonical_name(&self.name)
    }

    /// Relative path for extraction; `..`, roots and empty names are refused.
    pub fn output_path(&self) -> Result<PathBuf> {
        let normalized = self.name.replace('\\', "/");
        let path = PathBuf::from(&normalized);
        let safe = !normalized.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if safe {
            Ok(path)
        } else {
            Err(Error::UnsafePath(self.name.clone()))
        }
    }

    /// Extension of the last path segment.
    pub fn extension(&self) -> Option<&str> {
        Path::new(self.name.rsplit('\\').next().unwrap_or(&self.name))
            .extension()
            .and_then(|ext| ext.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> RgssEntry {
        RgssEntry::new(name.to_string(), 0, 4, 0)
    }

    #[test]
    fn test_output_path_normalization() {
        let path = entry(r"Data\Map001.rvdata2").output_path().unwrap();
        assert_eq!(path, PathBuf::from("Data/Map001.rvdata2"));
    }

    #[test]
    fn test_output_path_rejects_traversal() {
        assert!(entry(r"..\..\evil.txt").output_path().is_err());
        assert!(entry("/etc/passwd").output_path().is_err());
        assert!(entry("").output_path().is_err());
    }

    #[test]
    fn test_name_separator_normalized() {
        let e = entry("Graphics/Characters/Actor1.png");
        assert_eq!(e.name(), r"Graphics\Characters\Actor1.png");
        assert_eq!(e.canonical_name(), r"graphics\characters\actor1.png");
    }

    #[test]
    fn test_extension() {
        assert_eq!(entry(r"Data\Actors.rvdata").extension(), Some("rvdata"));
        assert_eq!(entry(r"Data.dir\README").extension(), None);
    }
}
