//! An opened project.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tsukuru_common::{WarningKind, Warnings};
use tsukuru_crypt::{KeyError, KeyState};
use tsukuru_rgss::RgssArchive;

use crate::decode::SchemaDecoder;
use crate::engine::{discover, discover_as, Discovery, Engine};
use crate::Result;

/// Bytes of one data file and where they came from.
#[derive(Debug, Clone)]
pub struct DataFile {
    /// File name used in warnings, e.g. `Map003.json` or `Game.rgss3a:Data\Map003.rvdata2`.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A discovered project: engine, locations, archive and resource key.
///
/// The engine, and with it the schema decoder, is fixed when the handle is opened.
#[derive(Debug)]
pub struct ProjectHandle {
    engine: Engine,
    root: PathBuf,
    data_dir: PathBuf,
    archive: Option<Arc<RgssArchive>>,
    key: KeyState,
    decoder: SchemaDecoder,
    warnings: Warnings,
}

impl ProjectHandle {
    /// Discover and open the project at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_discovery(discover(path)?)
    }

    /// Open `path` as a specific engine.
    pub fn open_as(path: &Path, engine: Engine) -> Result<Self> {
        Self::from_discovery(discover_as(path, engine)?)
    }

    pub fn from_discovery(discovery: Discovery) -> Result<Self> {
        let Discovery {
            engine,
            root,
            data_dir,
            archive,
        } = discovery;
        let mut warnings = Warnings::new();

        let archive = match archive {
            Some(path) => match RgssArchive::open(&path) {
                Ok(archive) => {
                    warnings.extend(archive.warnings().clone());
                    Some(Arc::new(archive))
                }
                // Loose data files can still carry the project.
                Err(e) if data_dir.is_dir() => {
                    warnings.push(WarningKind::Format, path.display().to_string(), e.to_string());
                    None
                }
                Err(e) => return Err(e.into()),
            },
            None => None,
        };

        let key = if engine.is_json() {
            match fs::read(data_dir.join("System.json")) {
                Ok(bytes) => KeyState::from_system_json(&bytes),
                Err(e) if e.kind() == io::ErrorKind::NotFound => KeyState::Unavailable(KeyError::Missing),
                Err(e) => KeyState::Unavailable(KeyError::Unreadable(e.to_string())),
            }
        } else {
            KeyState::Unavailable(KeyError::Missing)
        };

        tracing::debug!(
            engine = %engine,
            root = %root.display(),
            archive = archive.is_some(),
            key = key.is_available(),
            "project_opened"
        );

        Ok(Self {
            engine,
            root,
            data_dir,
            archive,
            key,
            decoder: SchemaDecoder::for_engine(engine),
            warnings,
        })
    }

    #[inline]
    pub fn engine(&self) -> Engine {
        self.engine
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn archive(&self) -> Option<&Arc<RgssArchive>> {
        self.archive.as_ref()
    }

    /// Resource decryption key state.
    pub fn key(&self) -> &KeyState {
        &self.key
    }

    #[inline]
    pub fn decoder(&self) -> SchemaDecoder {
        self.decoder
    }

    /// Conditions recorded while opening (archive directory problems).
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// Read the data file `stem` (e.g. `Map003`), on disk first, then in the
    /// archive. `Ok(None)` when it exists in neither.
    pub fn read_data(&self, stem: &str) -> Result<Option<DataFile>> {
        for ext in self.engine.data_extensions() {
            let file_name = format!("{stem}.{ext}");
            let path = self.data_dir.join(&file_name);
            match fs::read(&path) {
                Ok(bytes) => {
                    return Ok(Some(DataFile {
                        name: file_name,
                        bytes,
                    }))
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        let Some(archive) = &self.archive else {
            return Ok(None);
        };
        for ext in self.engine.data_extensions() {
            let entry_name = format!("Data\\{stem}.{ext}");
            if let Some(entry) = archive.find(&entry_name) {
                return Ok(Some(DataFile {
                    name: format!("{}:{}", archive.name(), entry.name()),
                    bytes: archive.read(entry)?,
                }));
            }
        }
        Ok(None)
    }

    /// Whether the data file `stem` exists anywhere.
    pub fn has_data(&self, stem: &str) -> bool {
        self.engine.data_extensions().iter().any(|ext| {
            let file_name = format!("{stem}.{ext}");
            self.data_dir.join(&file_name).is_file()
                || self
                    .archive
                    .as_ref()
                    .is_some_and(|archive| archive.find(&format!("Data\\{file_name}")).is_some())
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::Error;
    use tsukuru_rgss::{decrypt_payload, KeyStream, SEED};

    /// Build a version 1 archive holding `files`.
    pub(crate) fn rgssad(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = b"RGSSAD\0\x01".to_vec();
        let mut keys = KeyStream::new(SEED);
        for (name, data) in files {
            out.extend((name.len() as u32 ^ keys.key()).to_le_bytes());
            keys.advance();
            for b in name.bytes() {
                out.push(b ^ (keys.key() & 0xFF) as u8);
                keys.advance();
            }
            out.extend((data.len() as u32 ^ keys.key()).to_le_bytes());
            keys.advance();
            out.extend(decrypt_payload(data, keys.key()));
        }
        out
    }

    #[test]
    fn test_reads_disk_before_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = rgssad(&[
            (r"Data\Items.rvdata", b"from archive".as_slice()),
            (r"Data\Skills.rvdata", b"archive only".as_slice()),
        ]);
        fs::write(dir.path().join("Game.rgss2a"), archive).unwrap();
        fs::create_dir_all(dir.path().join("Data")).unwrap();
        fs::write(dir.path().join("Data/Items.rvdata"), b"from disk").unwrap();

        let handle = ProjectHandle::open(dir.path()).unwrap();
        assert_eq!(handle.engine(), Engine::Vx);
        assert_eq!(handle.decoder(), SchemaDecoder::Marshal);
        assert!(!handle.key().is_available());

        assert_eq!(handle.read_data("Items").unwrap().unwrap().bytes, b"from disk");
        let skills = handle.read_data("Skills").unwrap().unwrap();
        assert_eq!(skills.bytes, b"archive only");
        assert!(skills.name.ends_with(r"Data\Skills.rvdata"));
        assert!(handle.read_data("Enemies").unwrap().is_none());
        assert!(handle.has_data("Skills"));
    }

    #[test]
    fn test_json_key_from_system() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/MapInfos.json"), b"[null]").unwrap();
        fs::write(
            dir.path().join("data/System.json"),
            br#"{"encryptionKey": "d41d8cd98f00b204e9800998ecf8427e"}"#,
        )
        .unwrap();

        let handle = ProjectHandle::open(dir.path()).unwrap();
        assert_eq!(handle.engine(), Engine::Mz);
        assert_eq!(handle.decoder(), SchemaDecoder::Json);
        assert!(handle.key().is_available());
    }

    #[test]
    fn test_unreadable_system_keeps_cause() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/MapInfos.json"), b"[null]").unwrap();

        let missing = ProjectHandle::open(dir.path()).unwrap();
        assert_eq!(missing.key(), &KeyState::Unavailable(KeyError::Missing));

        // A directory where the file should be cannot be read as one.
        fs::create_dir_all(dir.path().join("data/System.json")).unwrap();
        let unreadable = ProjectHandle::open(dir.path()).unwrap();
        assert!(matches!(unreadable.key(), KeyState::Unavailable(KeyError::Unreadable(_))));
    }

    #[test]
    fn test_corrupt_archive_without_data_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Game.rgss3a"), b"not an archive").unwrap();
        assert!(matches!(ProjectHandle::open(dir.path()), Err(Error::Archive(_))));
    }
}
