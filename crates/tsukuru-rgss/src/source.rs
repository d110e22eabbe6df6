//! Archive entries as byte sources.

use std::borrow::Cow;
use std::sync::Arc;

use tsukuru_common::ByteSource;

use crate::{Error, Result, RgssArchive, RgssEntry};

/// One archive entry exposed through [`ByteSource`].
///
/// Reads decode only the requested window, so a decoder can treat an entry
/// exactly like a loose file.
#[derive(Debug, Clone)]
pub struct ArchiveEntrySource {
    archive: Arc<RgssArchive>,
    entry: RgssEntry,
}

impl ArchiveEntrySource {
    /// The entry this source reads.
    pub fn entry(&self) -> &RgssEntry {
        &self.entry
    }
}

impl RgssArchive {
    /// Open an entry as a [`ByteSource`].
    pub fn entry_source(self: &Arc<Self>, name: &str) -> Result<ArchiveEntrySource> {
        let entry = self
            .find(name)
            .cloned()
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        Ok(ArchiveEntrySource {
            archive: Arc::clone(self),
            entry,
        })
    }
}

impl ByteSource for ArchiveEntrySource {
    fn len(&self) -> u64 {
        u64::from(self.entry.size())
    }

    fn read_at(&self, offset: u64, len: usize) -> tsukuru_common::Result<Cow<'_, [u8]>> {
        self.archive
            .read_window(&self.entry, offset, len)
            .map(Cow::Owned)
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.archive.name(), self.entry.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::{seeded_archive, sequential_archive};

    #[test]
    fn test_windows_match_whole_entry() {
        let payload: Vec<u8> = (0..=40u8).collect();
        let files: [(&str, &[u8]); 2] = [("pad.bin", b"xyz"), (r"Data\System.rvdata2", &payload)];

        for bytes in [sequential_archive(&files), seeded_archive(99, &files)] {
            let archive = Arc::new(RgssArchive::from_bytes("fixture", bytes).unwrap());
            let source = archive.entry_source("data/system.rvdata2").unwrap();

            assert_eq!(source.len(), payload.len() as u64);
            assert_eq!(&*source.read_all().unwrap(), payload.as_slice());
            assert_eq!(&*source.read_at(5, 7).unwrap(), &payload[5..12]);
            assert_eq!(&*source.read_at(40, 1).unwrap(), &payload[40..]);
            assert!(source.read_at(38, 4).unwrap_err().is_truncation());
        }
    }

    #[test]
    fn test_describe_names_archive_and_entry() {
        let archive = Arc::new(
            RgssArchive::from_bytes("Game.rgss3a", seeded_archive(1, &[("Data/Items.rvdata2", b"\x04\x08[\x00")]))
                .unwrap(),
        );
        let source = archive.entry_source("Data/Items.rvdata2").unwrap();
        assert_eq!(source.describe(), r"Game.rgss3a:Data\Items.rvdata2");
        assert!(archive.entry_source("Data/Missing.rvdata2").is_err());
    }
}
