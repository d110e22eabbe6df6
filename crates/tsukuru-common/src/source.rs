//! Random-access byte sources.
//!
//! Project data lives either as loose files on disk or as entries inside an
//! encrypted archive. Decoders only see a [`ByteSource`], so the same schema
//! code handles both.

use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::{Error, Result};

/// Uniform random-access read over a blob of bytes.
pub trait ByteSource: Send + Sync {
    /// Total length in bytes.
    fn len(&self) -> u64;

    /// Whether the source holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read `len` bytes starting at `offset`.
    ///
    /// Fails with [`Error::Truncated`] if the range runs past the end.
    fn read_at(&self, offset: u64, len: usize) -> Result<Cow<'_, [u8]>>;

    /// Read the whole source.
    fn read_all(&self) -> Result<Cow<'_, [u8]>> {
        self.read_at(0, self.len() as usize)
    }

    /// Human readable origin, used in warnings.
    fn describe(&self) -> String;
}

pub(crate) fn check_range(what: &str, total: u64, offset: u64, len: usize) -> Result<()> {
    let end = offset.checked_add(len as u64);
    match end {
        Some(end) if end <= total => Ok(()),
        _ => Err(Error::truncated(what, offset.saturating_add(len as u64), total)),
    }
}

/// A memory-mapped loose file.
pub struct MappedFile {
    path: PathBuf,
    // Zero-length files cannot be mapped on every platform.
    map: Option<Mmap>,
}

impl MappedFile {
    /// Map a file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let map = if len == 0 {
            None
        } else {
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    /// Path this file was opened from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The mapped bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}

impl std::fmt::Debug for MappedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedFile")
            .field("path", &self.path)
            .field("len", &self.as_bytes().len())
            .finish()
    }
}

impl ByteSource for MappedFile {
    fn len(&self) -> u64 {
        self.as_bytes().len() as u64
    }

    fn read_at(&self, offset: u64, len: usize) -> Result<Cow<'_, [u8]>> {
        check_range(&self.describe(), self.len(), offset, len)?;
        let start = offset as usize;
        Ok(Cow::Borrowed(&self.as_bytes()[start..start + len]))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Owned in-memory bytes, mostly for fixtures and already-decoded payloads.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

impl ByteSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_at(&self, offset: u64, len: usize) -> Result<Cow<'_, [u8]>> {
        check_range(&self.name, self.len(), offset, len)?;
        let start = offset as usize;
        Ok(Cow::Borrowed(&self.data[start..start + len]))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_mapped_file_reads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"MapInfos").unwrap();
        file.flush().unwrap();

        let source = MappedFile::open(file.path()).unwrap();
        assert_eq!(source.len(), 8);
        assert_eq!(&*source.read_at(3, 5).unwrap(), b"Infos");
        assert!(source.read_at(4, 5).unwrap_err().is_truncation());
    }

    #[test]
    fn test_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let source = MappedFile::open(file.path()).unwrap();
        assert!(source.is_empty());
        assert!(source.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_memory_source_overflowing_range() {
        let source = MemorySource::new("fixture", vec![1, 2, 3]);
        assert!(source.read_at(u64::MAX, 2).is_err());
        assert_eq!(&*source.read_all().unwrap(), &[1, 2, 3]);
    }
}
