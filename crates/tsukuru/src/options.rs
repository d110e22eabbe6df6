//! Load configuration.

use std::path::{Path, PathBuf};

use tsukuru_data::Engine;

/// Cache directory used when none is set, relative to the game root.
pub const DEFAULT_CACHE_DIR: &str = "cache/decrypted";

/// How [`Session::load`](crate::Session::load) opens a project.
///
/// ```
/// use tsukuru::LoadOptions;
///
/// let options = LoadOptions::new().prepare_resources(true).parallel(false);
/// assert!(options.prepares_resources());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    cache_dir: Option<PathBuf>,
    prepare_resources: bool,
    engine: Option<Engine>,
    parallel: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            cache_dir: None,
            prepare_resources: false,
            engine: None,
            parallel: cfg!(feature = "parallel"),
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root of the decrypted-resource cache.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Decrypt obfuscated images and audio into the cache during load.
    pub fn prepare_resources(mut self, enabled: bool) -> Self {
        self.prepare_resources = enabled;
        self
    }

    /// Skip engine detection.
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Use the worker pool. Ignored without the `parallel` feature.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled && cfg!(feature = "parallel");
        self
    }

    pub fn prepares_resources(&self) -> bool {
        self.prepare_resources
    }

    pub fn engine_override(&self) -> Option<Engine> {
        self.engine
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Cache root for a game at `root`.
    pub fn resolved_cache_dir(&self, root: &Path) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| root.join(DEFAULT_CACHE_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LoadOptions::default();
        assert!(!options.prepares_resources());
        assert_eq!(options.engine_override(), None);
        assert_eq!(options.is_parallel(), cfg!(feature = "parallel"));
        assert_eq!(
            options.resolved_cache_dir(Path::new("/games/quest")),
            Path::new("/games/quest/cache/decrypted")
        );
    }

    #[test]
    fn test_builder() {
        let options = LoadOptions::new().cache_dir("/tmp/c").engine(Engine::VxAce).parallel(false);
        assert_eq!(options.resolved_cache_dir(Path::new("/g")), Path::new("/tmp/c"));
        assert_eq!(options.engine_override(), Some(Engine::VxAce));
        assert!(!options.is_parallel());
    }
}
