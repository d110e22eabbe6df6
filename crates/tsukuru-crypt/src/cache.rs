//! Decrypted-resource cache.
//!
//! Output files are addressed by key fingerprint and relative source path:
//! `<root>/<fingerprint>/<path with original extension>`. The same input always
//! lands on the same path with the same bytes, so concurrent writers can race
//! freely: identical content already on disk is left alone, and new content is
//! written to a private temp file and renamed into place.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use crate::{decrypted_path, Error, ResourceKey, Result};

/// Result of [`ResourceCache::store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Written(PathBuf),
    /// Identical bytes were already cached.
    Unchanged(PathBuf),
}

impl StoreOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::Unchanged(path) => path,
        }
    }
}

/// Handle to a cache directory. Nothing is created until the first store.
#[derive(Debug, Clone)]
pub struct ResourceCache {
    root: PathBuf,
}

impl ResourceCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything decrypted with `key`.
    pub fn key_dir(&self, key: &ResourceKey) -> PathBuf {
        self.root.join(key.fingerprint())
    }

    /// Cache path for a source file given relative to the game root.
    pub fn path_for(&self, relative: &Path, key: &ResourceKey) -> Result<PathBuf> {
        let safe = relative.components().next().is_some()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(Error::UnsafePath(relative.display().to_string()));
        }

        let target = decrypted_path(relative).unwrap_or_else(|| relative.to_path_buf());
        Ok(self.key_dir(key).join(target))
    }

    /// Cached path for a source file, if it has been stored.
    pub fn get(&self, relative: &Path, key: &ResourceKey) -> Option<PathBuf> {
        self.path_for(relative, key).ok().filter(|path| path.is_file())
    }

    /// Store decrypted bytes. A no-op when the same bytes are already cached.
    pub fn store(&self, relative: &Path, key: &ResourceKey, bytes: &[u8]) -> Result<StoreOutcome> {
        let path = self.path_for(relative, key)?;
        if same_contents(&path, bytes) {
            return Ok(StoreOutcome::Unchanged(path));
        }

        write_bytes_atomic(&path, bytes)?;
        Ok(StoreOutcome::Written(path))
    }

    /// Remove every cached file.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn same_contents(path: &Path, bytes: &[u8]) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == bytes.len() as u64 => fs::read(path).is_ok_and(|existing| existing == bytes),
        _ => false,
    }
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::Builder::new().prefix(".").suffix(".tmp").tempfile_in(parent)?;
    tmp.write_all(bytes)?;
    match tmp.persist(path) {
        Ok(_) => Ok(()),
        // Another writer may have won the race with the same bytes.
        Err(_) if same_contents(path, bytes) => Ok(()),
        Err(e) => Err(e.error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ResourceKey {
        ResourceKey::from_hex("d41d8cd98f00b204e9800998ecf8427e").unwrap()
    }

    #[test]
    fn test_path_layout() {
        let cache = ResourceCache::new("/cache");
        let path = cache.path_for(Path::new("img/faces/Actor1.rpgmvp"), &key()).unwrap();
        assert_eq!(
            path,
            Path::new("/cache").join(key().fingerprint()).join("img/faces/Actor1.png")
        );
    }

    #[test]
    fn test_keys_do_not_collide() {
        let cache = ResourceCache::new("/cache");
        let other = ResourceKey::from_hex("00000000000000000000000000000000").unwrap();
        let rel = Path::new("img/pictures/Title.rpgmvp");
        assert_ne!(cache.path_for(rel, &key()).unwrap(), cache.path_for(rel, &other).unwrap());
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let cache = ResourceCache::new("/cache");
        assert!(cache.path_for(Path::new("../outside.rpgmvp"), &key()).is_err());
        assert!(cache.path_for(Path::new("/abs.rpgmvp"), &key()).is_err());
        assert!(cache.path_for(Path::new(""), &key()).is_err());
    }

    #[test]
    fn test_store_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResourceCache::new(dir.path().join("decrypted"));
        let rel = Path::new("img/system/Window.rpgmvp");

        let first = cache.store(rel, &key(), b"png bytes").unwrap();
        assert!(matches!(first, StoreOutcome::Written(_)));
        let second = cache.store(rel, &key(), b"png bytes").unwrap();
        assert_eq!(second, StoreOutcome::Unchanged(first.path().to_path_buf()));
        assert_eq!(fs::read(first.path()).unwrap(), b"png bytes");
        assert_eq!(cache.get(rel, &key()).as_deref(), Some(first.path()));

        let leftovers = fs::read_dir(first.path().parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_store_replaces_stale_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResourceCache::new(dir.path());
        let rel = Path::new("img/a.rpgmvp");
        let stale = cache.path_for(rel, &key()).unwrap();
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"older").unwrap();

        let outcome = cache.store(rel, &key(), b"fresh bytes").unwrap();
        assert_eq!(outcome, StoreOutcome::Written(stale.clone()));
        assert_eq!(fs::read(&stale).unwrap(), b"fresh bytes");
        assert_eq!(fs::read_dir(stale.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_concurrent_stores_agree() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResourceCache::new(dir.path());
        let rel = Path::new("audio/bgm/Battle1.rpgmvo");
        let bytes = vec![7u8; 4096];

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| cache.store(rel, &key(), &bytes).unwrap());
            }
        });

        assert_eq!(fs::read(cache.get(rel, &key()).unwrap()).unwrap(), bytes);
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResourceCache::new(dir.path().join("decrypted"));
        cache.clear().unwrap();

        let rel = Path::new("img/a.rpgmvp");
        cache.store(rel, &key(), b"x").unwrap();
        cache.clear().unwrap();
        assert!(cache.get(rel, &key()).is_none());
    }
}
