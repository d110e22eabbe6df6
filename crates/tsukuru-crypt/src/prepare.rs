//! Bulk decryption of a project's obfuscated resources into the cache.

use std::fs;
use std::path::{Path, PathBuf};

use tsukuru_common::{WarningKind, Warnings};
use walkdir::WalkDir;

use crate::{decrypt, AssetKind, Error, KeyError, KeyState, ResourceCache, ResourceKey, StoreOutcome};

/// Directory the engine's own resource cache lives in; never scanned.
const ENGINE_CACHE_DIR: &str = "data_cache";

/// Overall outcome of [`prepare_resources`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareStatus {
    /// The project has no obfuscated resources.
    NotNeeded,
    /// Every obfuscated resource is in the cache.
    Decrypted,
    /// Some resources failed; see the warnings.
    Partial,
    /// Resources are obfuscated but there is no usable key.
    Unavailable(KeyError),
}

/// Summary of a preparation run.
#[derive(Debug, Clone)]
pub struct PrepareReport {
    pub status: PrepareStatus,
    /// Obfuscated files found.
    pub found: usize,
    pub written: usize,
    /// Already cached with identical bytes.
    pub unchanged: usize,
    pub failed: usize,
    /// Where decrypted files for this key live.
    pub output_dir: Option<PathBuf>,
    pub warnings: Warnings,
}

impl PrepareReport {
    fn empty(status: PrepareStatus, found: usize) -> Self {
        Self {
            status,
            found,
            written: 0,
            unchanged: 0,
            failed: 0,
            output_dir: None,
            warnings: Warnings::new(),
        }
    }
}

/// Obfuscated resources under `root`, as sorted paths relative to it.
///
/// The engine's `data_cache` directory and anything under `skip` are ignored.
pub fn find_encrypted_resources(root: &Path, skip: Option<&Path>) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            let is_engine_cache = entry.file_type().is_dir() && entry.file_name() == ENGINE_CACHE_DIR;
            let is_skipped = skip.is_some_and(|skip| entry.path().starts_with(skip));
            !is_engine_cache && !is_skipped
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && AssetKind::from_path(entry.path()).is_some())
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    found.sort();
    found
}

/// Decrypt every obfuscated resource under `root` into `cache`.
pub fn prepare_resources(root: &Path, key: &KeyState, cache: &ResourceCache) -> PrepareReport {
    prepare_resources_with(root, key, cache, |_| {})
}

/// Like [`prepare_resources`], calling `on_file` after each file is handled.
pub fn prepare_resources_with<F>(root: &Path, key: &KeyState, cache: &ResourceCache, on_file: F) -> PrepareReport
where
    F: Fn(&Path) + Sync,
{
    let found = find_encrypted_resources(root, Some(cache.root()));
    if found.is_empty() {
        return PrepareReport::empty(PrepareStatus::NotNeeded, 0);
    }

    let key = match key {
        KeyState::Available(key) => key,
        KeyState::Unavailable(reason) => {
            let mut report = PrepareReport::empty(PrepareStatus::Unavailable(reason.clone()), found.len());
            report
                .warnings
                .push(WarningKind::Key, root.display().to_string(), reason.to_string());
            return report;
        }
    };

    let process = |relative: &Path| {
        let result = prepare_one(root, relative, key, cache);
        on_file(relative);
        result
    };

    #[cfg(feature = "parallel")]
    let results: Vec<_> = {
        use rayon::prelude::*;
        found.par_iter().map(|relative| (relative, process(relative))).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = found.iter().map(|relative| (relative, process(relative))).collect();

    let mut report = PrepareReport::empty(PrepareStatus::Decrypted, found.len());
    report.output_dir = Some(cache.key_dir(key));
    for (relative, result) in results {
        match result {
            Ok(StoreOutcome::Written(_)) => report.written += 1,
            Ok(StoreOutcome::Unchanged(_)) => report.unchanged += 1,
            Err(e) => {
                report.failed += 1;
                report
                    .warnings
                    .push(e.warning_kind(), relative.display().to_string(), e.to_string());
            }
        }
    }
    if report.failed > 0 {
        report.status = PrepareStatus::Partial;
    }

    tracing::debug!(
        root = %root.display(),
        found = report.found,
        written = report.written,
        unchanged = report.unchanged,
        failed = report.failed,
        "resources_prepared"
    );
    report
}

fn prepare_one(root: &Path, relative: &Path, key: &ResourceKey, cache: &ResourceCache) -> Result<StoreOutcome, Error> {
    let kind = AssetKind::from_path(relative).unwrap_or(AssetKind::Unknown);
    let data = fs::read(root.join(relative))?;
    let plain = decrypt(&data, key, kind)?;
    cache.store(relative, key, &plain)
}
