//! RGSSAD archive reader.
//!
//! The directory is decoded once when the archive is opened. After that every
//! entry is independent: reads re-derive the payload key stream from the key
//! recorded on the entry, so entries can be read in any order, concurrently.

use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;
use tsukuru_common::text::decode_lossy;
use tsukuru_common::{BinaryReader, ByteSource, Loaded, MappedFile, MemorySource, WarningKind, Warnings};
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::crypto::{apply_payload_keystream, decrypt_payload, seeded_directory_key, KeyStream, SEED};
use crate::entry::{canonical_name, RgssEntry};
use crate::{Error, Result};

type FxHashMap<K, V> = FastHashMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// File signature shared by every RGSSAD version.
pub const MAGIC: &[u8; 6] = b"RGSSAD";

/// Directory layout version from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveVersion {
    /// `Game.rgssad` (XP) and `Game.rgss2a` (VX).
    V1,
    /// Same layout as V1; seen in a few tool-produced archives.
    V2,
    /// `Game.rgss3a` (VX Ace), seeded directory.
    V3,
}

impl ArchiveVersion {
    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    /// Version number as stored in the header.
    pub fn number(&self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    /// Whether the directory uses a per-archive seed.
    pub fn is_seeded(&self) -> bool {
        matches!(self, Self::V3)
    }
}

/// Seeded directory record following the offset field. Every field is XORed
/// with the directory key.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct SeededFields {
    size: U32,
    key: U32,
    name_len: U32,
}

/// A directory record before validation.
#[derive(Debug)]
struct Candidate {
    name: String,
    offset: u64,
    size: u32,
    key: u32,
}

/// An opened RGSSAD archive.
pub struct RgssArchive {
    source: Box<dyn ByteSource>,
    name: String,
    version: ArchiveVersion,
    entries: Vec<RgssEntry>,
    index: FxHashMap<String, usize>,
    warnings: Warnings,
}

impl RgssArchive {
    /// Open an archive file by memory-mapping it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("archive")
            .to_string();

        let source = MappedFile::open(path)?;
        Self::from_source(name, Box::new(source))
    }

    /// Parse an archive held in memory.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let source = MemorySource::new(name.clone(), data);
        Self::from_source(name, Box::new(source))
    }

    /// Parse an archive from any byte source.
    ///
    /// Fails only if the header is unusable. Bad directory records become
    /// warnings.
    pub fn from_source(name: String, source: Box<dyn ByteSource>) -> Result<Self> {
        let (version, candidates, mut warnings) = {
            let data = source.read_all()?;
            let mut reader = BinaryReader::new(&data);
            reader.expect_magic(MAGIC)?;
            reader.skip(1)?;
            let version = ArchiveVersion::from_byte(reader.read_u8()?)?;

            let mut warnings = Warnings::new();
            let candidates = if version.is_seeded() {
                read_seeded_directory(&mut reader, &name, &mut warnings)?
            } else {
                read_sequential_directory(&mut reader, &name, &mut warnings)
            };
            (version, candidates, warnings)
        };

        let (entries, index) = validate(candidates, source.len(), &name, &mut warnings);
        tracing::debug!(
            archive = %name,
            version = version.number(),
            entries = entries.len(),
            dropped = warnings.len(),
            "archive_opened"
        );

        Ok(Self {
            source,
            name,
            version,
            entries,
            index,
            warnings,
        })
    }

    /// Get the archive name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the directory version.
    #[inline]
    pub fn version(&self) -> ArchiveVersion {
        self.version
    }

    /// Get the number of entries.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries in directory order.
    #[inline]
    pub fn entries(&self) -> &[RgssEntry] {
        &self.entries
    }

    /// Directory records that were dropped while opening.
    #[inline]
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// Find an entry by name (case-insensitive, either separator).
    pub fn find(&self, name: &str) -> Option<&RgssEntry> {
        self.index
            .get(&canonical_name(name))
            .map(|&index| &self.entries[index])
    }

    /// Read and decode an entry's contents.
    pub fn read(&self, entry: &RgssEntry) -> Result<Vec<u8>> {
        let raw = self.source.read_at(entry.offset(), entry.size() as usize)?;
        Ok(decrypt_payload(&raw, entry.key()))
    }

    /// Read an entry by name.
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .find(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        self.read(entry)
    }

    /// Decode `len` bytes starting `offset` bytes into an entry.
    pub(crate) fn read_window(
        &self,
        entry: &RgssEntry,
        offset: u64,
        len: usize,
    ) -> tsukuru_common::Result<Vec<u8>> {
        let available = u64::from(entry.size());
        let end = offset.saturating_add(len as u64);
        if end > available {
            return Err(tsukuru_common::Error::truncated(entry.name(), end, available));
        }

        let mut window = self.source.read_at(entry.offset() + offset, len)?.into_owned();
        let mut stream = KeyStream::new(entry.key());
        stream.advance_by(offset / 4);
        apply_payload_keystream(&mut window, &mut stream, (offset % 4) as usize);
        Ok(window)
    }

    /// Decode one entry into `dir`, returning the written path.
    pub fn extract_entry(&self, entry: &RgssEntry, dir: &Path) -> Result<PathBuf> {
        let target = dir.join(entry.output_path()?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, self.read(entry)?)?;
        Ok(target)
    }

    /// Decode every entry into `dir`.
    ///
    /// Entries that fail to extract are reported as warnings; the value is the
    /// number of files written.
    pub fn extract_all<P: AsRef<Path>>(&self, dir: P) -> Loaded<usize> {
        let dir = dir.as_ref();

        #[cfg(feature = "parallel")]
        let results: Vec<_> = {
            use rayon::prelude::*;
            self.entries
                .par_iter()
                .map(|entry| (entry, self.extract_entry(entry, dir)))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let results: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (entry, self.extract_entry(entry, dir)))
            .collect();

        let mut warnings = Warnings::new();
        let mut written = 0;
        for (entry, result) in results {
            match result {
                Ok(_) => written += 1,
                Err(e) => warnings.push(WarningKind::Io, entry.name(), e.to_string()),
            }
        }
        Loaded::new(written, warnings)
    }
}

impl std::fmt::Debug for RgssArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgssArchive")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("entry_count", &self.entries.len())
            .finish()
    }
}

/// Walk a version 1/2 directory. The key stream advances across every field,
/// and payloads sit between records.
fn read_sequential_directory(
    reader: &mut BinaryReader<'_>,
    context: &str,
    warnings: &mut Warnings,
) -> Vec<Candidate> {
    let mut keys = KeyStream::new(SEED);
    let mut candidates = Vec::new();

    while !reader.is_empty() {
        let record_at = reader.position();
        match read_sequential_record(reader, &mut keys) {
            Ok(Some(candidate)) => {
                let payload_fits = reader.skip(candidate.size as usize).is_ok();
                candidates.push(candidate);
                // An overrunning payload is reported during validation; nothing
                // after it can be located.
                if !payload_fits {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warnings.push(
                    WarningKind::Truncated,
                    context,
                    format!("directory record at {record_at:#x} cut short: {e}"),
                );
                break;
            }
        }
    }

    candidates
}

fn read_sequential_record(
    reader: &mut BinaryReader<'_>,
    keys: &mut KeyStream,
) -> tsukuru_common::Result<Option<Candidate>> {
    let name_len = keys.decode_u32(reader.read_u32()?) as i32;
    if name_len <= 0 {
        return Ok(None);
    }

    let raw_name = reader.read_bytes(name_len as usize)?;
    let name: Vec<u8> = raw_name.iter().map(|&b| keys.decode_name_byte(b)).collect();
    let size = keys.decode_u32(reader.read_u32()?);

    Ok(Some(Candidate {
        name: decode_lossy(&name),
        offset: reader.position() as u64,
        size,
        key: keys.key(),
    }))
}

/// Walk a version 3 directory, terminated by a zero offset.
fn read_seeded_directory(
    reader: &mut BinaryReader<'_>,
    context: &str,
    warnings: &mut Warnings,
) -> Result<Vec<Candidate>> {
    let mask = seeded_directory_key(reader.read_u32()?);
    let mask_bytes = mask.to_le_bytes();
    let mut candidates = Vec::new();

    loop {
        let record_at = reader.position();
        let record = reader.read_u32().and_then(|offset| {
            let offset = offset ^ mask;
            if offset == 0 {
                return Ok(None);
            }
            let fields = reader.read_struct::<SeededFields>()?;
            let name_len = (fields.name_len.get() ^ mask) as usize;
            let raw_name = reader.read_bytes(name_len)?;
            Ok(Some((offset, fields, raw_name)))
        });

        match record {
            Ok(Some((offset, fields, raw_name))) => {
                let name: Vec<u8> = raw_name
                    .iter()
                    .enumerate()
                    .map(|(i, &b)| b ^ mask_bytes[i % 4])
                    .collect();
                candidates.push(Candidate {
                    name: decode_lossy(&name),
                    offset: u64::from(offset),
                    size: fields.size.get() ^ mask,
                    key: fields.key.get() ^ mask,
                });
            }
            Ok(None) => break,
            Err(e) => {
                warnings.push(
                    WarningKind::Truncated,
                    context,
                    format!("directory record at {record_at:#x} cut short: {e}"),
                );
                break;
            }
        }
    }

    Ok(candidates)
}

/// Drop records that cannot be read and build the name index.
///
/// Kept entries are empty-free, inside the file, pairwise non-overlapping and
/// uniquely named.
fn validate(
    candidates: Vec<Candidate>,
    file_len: u64,
    context: &str,
    warnings: &mut Warnings,
) -> (Vec<RgssEntry>, FxHashMap<String, usize>) {
    let mut kept: Vec<Option<RgssEntry>> = candidates
        .into_iter()
        .map(|c| {
            if c.size == 0 {
                warnings.push(
                    WarningKind::Format,
                    context,
                    format!("dropping {}: zero-length entry", c.name),
                );
                return None;
            }
            let end = c.offset.saturating_add(u64::from(c.size));
            if end > file_len {
                warnings.push(
                    WarningKind::Truncated,
                    context,
                    format!(
                        "dropping {}: {} bytes at {:#x} run past end of file ({} bytes)",
                        c.name, c.size, c.offset, file_len
                    ),
                );
                return None;
            }
            Some(RgssEntry::new(c.name, c.offset, c.size, c.key))
        })
        .collect();

    let mut by_offset: Vec<usize> = (0..kept.len()).filter(|&i| kept[i].is_some()).collect();
    by_offset.sort_by_key(|&i| kept[i].as_ref().map_or(0, RgssEntry::offset));

    let mut covered_until = 0u64;
    for i in by_offset {
        let Some(entry) = kept[i].as_ref() else {
            continue;
        };
        if entry.offset() < covered_until {
            let message = format!(
                "dropping {}: payload at {:#x} overlaps a previous entry",
                entry.name(),
                entry.offset()
            );
            warnings.push(WarningKind::Format, context, message);
            kept[i] = None;
            continue;
        }
        covered_until = entry.end();
    }

    let mut entries = Vec::with_capacity(kept.len());
    let mut index = FxHashMap::default();
    for entry in kept.into_iter().flatten() {
        let key = entry.canonical_name();
        if index.contains_key(&key) {
            warnings.push(
                WarningKind::Schema,
                context,
                format!("duplicate entry name {}, keeping the first", entry.name()),
            );
            continue;
        }
        index.insert(key, entries.len());
        entries.push(entry);
    }

    (entries, index)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a version 1 archive. The third tuple field is the declared size.
    pub(crate) fn sequential_archive_with(files: &[(&str, &[u8], u32)]) -> Vec<u8> {
        let mut out = b"RGSSAD\0\x01".to_vec();
        let mut keys = KeyStream::new(SEED);
        for (name, data, declared) in files {
            out.extend((name.len() as u32 ^ keys.key()).to_le_bytes());
            keys.advance();
            for b in name.bytes() {
                out.push(b ^ (keys.key() & 0xFF) as u8);
                keys.advance();
            }
            out.extend((declared ^ keys.key()).to_le_bytes());
            keys.advance();
            out.extend(decrypt_payload(data, keys.key()));
        }
        out
    }

    pub(crate) fn sequential_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
        let files: Vec<_> = files
            .iter()
            .map(|(name, data)| (*name, *data, data.len() as u32))
            .collect();
        sequential_archive_with(&files)
    }

    /// Build a version 3 archive. `extra` records (name, offset, size) are
    /// appended to the directory verbatim, without payloads.
    pub(crate) fn seeded_archive_with(
        seed: u32,
        files: &[(&str, &[u8])],
        extra: &[(&str, u32, u32)],
    ) -> Vec<u8> {
        let names_len: usize = files.iter().map(|(n, _)| 16 + n.len()).sum::<usize>()
            + extra.iter().map(|(n, _, _)| 16 + n.len()).sum::<usize>();
        let payload_start = 8 + 4 + names_len + 4;

        let mut records = Vec::new();
        let mut payload = Vec::new();
        for (i, (name, data)) in files.iter().enumerate() {
            let key = 0x0BAD_F00Du32.wrapping_add(i as u32 * 0x9E37);
            records.push((name.to_string(), (payload_start + payload.len()) as u32, data.len() as u32, key));
            payload.extend(decrypt_payload(data, key));
        }
        for (name, offset, size) in extra {
            records.push((name.to_string(), *offset, *size, 0x5EED));
        }

        let mask = seeded_directory_key(seed);
        let mask_bytes = mask.to_le_bytes();
        let mut out = b"RGSSAD\0\x03".to_vec();
        out.extend(seed.to_le_bytes());
        for (name, offset, size, key) in &records {
            out.extend((offset ^ mask).to_le_bytes());
            let fields = SeededFields {
                size: U32::new(size ^ mask),
                key: U32::new(key ^ mask),
                name_len: U32::new(name.len() as u32 ^ mask),
            };
            out.extend_from_slice(fields.as_bytes());
            out.extend(name.bytes().enumerate().map(|(i, b)| b ^ mask_bytes[i % 4]));
        }
        out.extend(mask.to_le_bytes());
        assert_eq!(out.len(), payload_start);
        out.extend(payload);
        out
    }

    pub(crate) fn seeded_archive(seed: u32, files: &[(&str, &[u8])]) -> Vec<u8> {
        seeded_archive_with(seed, files, &[])
    }

    const FILES: [(&str, &[u8]); 3] = [
        (r"Data\MapInfos.rvdata2", b"\x04\x08[\x00"),
        (r"Data\Map001.rvdata2", b"map payload with an odd length"),
        (r"Graphics\System\Window.png", b"\x89PNG\r\n\x1a\nwindow"),
    ];

    #[test]
    fn test_sequential_directory() {
        let archive = RgssArchive::from_bytes("Game.rgss2a", sequential_archive(&FILES)).unwrap();

        assert_eq!(archive.version(), ArchiveVersion::V1);
        assert_eq!(archive.entry_count(), 3);
        assert!(archive.warnings().is_empty());
        for (name, data) in FILES {
            assert_eq!(archive.read_entry(name).unwrap(), data);
        }
    }

    #[test]
    fn test_seeded_directory() {
        let archive = RgssArchive::from_bytes("Game.rgss3a", seeded_archive(3580, &FILES)).unwrap();

        assert_eq!(archive.version(), ArchiveVersion::V3);
        let names: Vec<_> = archive.entries().iter().map(RgssEntry::name).collect();
        assert_eq!(names, FILES.map(|(n, _)| n));
        assert_eq!(archive.read_entry(r"Data\MapInfos.rvdata2").unwrap(), b"\x04\x08[\x00");
    }

    #[test]
    fn test_read_order_independent() {
        for bytes in [sequential_archive(&FILES), seeded_archive(7, &FILES)] {
            let archive = RgssArchive::from_bytes("fixture", bytes).unwrap();
            let forward: Vec<_> = archive.entries().iter().map(|e| archive.read(e).unwrap()).collect();
            let mut backward: Vec<_> = archive
                .entries()
                .iter()
                .rev()
                .map(|e| archive.read(e).unwrap())
                .collect();
            backward.reverse();
            assert_eq!(forward, backward);
            assert_eq!(archive.read(&archive.entries()[1]).unwrap(), forward[1]);
        }
    }

    #[test]
    fn test_entry_past_end_is_dropped() {
        let bytes = seeded_archive_with(11, &FILES, &[(r"Data\Broken.rvdata2", 64, 1_000_000)]);
        let archive = RgssArchive::from_bytes("Game.rgss3a", bytes).unwrap();

        assert_eq!(archive.entry_count(), 3);
        assert!(archive.find(r"Data\Broken.rvdata2").is_none());
        assert_eq!(archive.warnings().len(), 1);
        assert_eq!(archive.warnings().count(WarningKind::Truncated), 1);
    }

    #[test]
    fn test_sequential_overrun_keeps_earlier_entries() {
        let bytes = sequential_archive_with(&[
            ("a.txt", b"alpha", 5),
            ("b.txt", b"beta", 4),
            ("c.txt", b"gamma", 5),
            ("d.txt", b"short", 4096),
        ]);
        let archive = RgssArchive::from_bytes("Game.rgssad", bytes).unwrap();

        assert_eq!(archive.entry_count(), 3);
        assert_eq!(archive.read_entry("c.txt").unwrap(), b"gamma");
        assert_eq!(archive.warnings().count(WarningKind::Truncated), 1);
    }

    #[test]
    fn test_zero_length_entry_dropped() {
        let bytes = sequential_archive(&[("empty.txt", b""), ("full.txt", b"data")]);
        let archive = RgssArchive::from_bytes("fixture", bytes).unwrap();

        assert_eq!(archive.entry_count(), 1);
        assert_eq!(archive.read_entry("full.txt").unwrap(), b"data");
        assert_eq!(archive.warnings().count(WarningKind::Format), 1);
    }

    #[test]
    fn test_overlapping_entry_dropped() {
        let extra = "overlap.bin";
        let payload_start = 12
            + FILES.iter().map(|(n, _)| 16 + n.len()).sum::<usize>()
            + 16
            + extra.len()
            + 4;
        let bytes = seeded_archive_with(5, &FILES, &[(extra, payload_start as u32 + 1, 2)]);
        let archive = RgssArchive::from_bytes("fixture", bytes).unwrap();

        assert_eq!(archive.entries()[0].offset(), payload_start as u64);
        assert_eq!(archive.entry_count(), 3);
        assert!(archive.find(extra).is_none());
        assert_eq!(archive.warnings().count(WarningKind::Format), 1);
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let bytes = sequential_archive(&[("Data/A.rvdata", b"first"), (r"DATA\a.RVDATA", b"second")]);
        let archive = RgssArchive::from_bytes("fixture", bytes).unwrap();

        assert_eq!(archive.entry_count(), 1);
        assert_eq!(archive.read_entry("data/a.rvdata").unwrap(), b"first");
        assert_eq!(archive.warnings().count(WarningKind::Schema), 1);
    }

    #[test]
    fn test_bad_magic() {
        let err = RgssArchive::from_bytes("not.zip", b"PK\x03\x04\x14\x00\x00\x00".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Common(tsukuru_common::Error::BadMagic { .. })));
    }

    #[test]
    fn test_unsupported_version() {
        let err = RgssArchive::from_bytes("future", b"RGSSAD\0\x09".to_vec()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(9)));
    }

    #[test]
    fn test_lookup_ignores_case_and_separator() {
        let archive = RgssArchive::from_bytes("fixture", seeded_archive(1, &FILES)).unwrap();
        assert!(archive.find("data/map001.RVDATA2").is_some());
        assert!(matches!(
            archive.read_entry(r"Data\Map999.rvdata2"),
            Err(Error::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_open_and_extract() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Game.rgss3a");
        fs::write(&path, seeded_archive(42, &FILES)).unwrap();

        let archive = RgssArchive::open(&path).unwrap();
        assert_eq!(archive.name(), "Game.rgss3a");

        let out = dir.path().join("out");
        let written = archive.extract_all(&out);
        assert_eq!(written.value, 3);
        assert!(written.warnings.is_empty());
        assert_eq!(
            fs::read(out.join("Data").join("Map001.rvdata2")).unwrap(),
            b"map payload with an odd length"
        );
    }
}
