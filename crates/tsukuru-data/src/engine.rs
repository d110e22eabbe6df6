//! Engine families and project discovery.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{Error, Result};

/// The four supported authoring-tool generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// RPG Maker MV: JSON data, `www/` layout, `rpg_core.js`.
    Mv,
    /// RPG Maker MZ: JSON data, flat layout, `rmmz_core.js`.
    Mz,
    /// RPG Maker VX Ace: `.rvdata2` Marshal data, `Game.rgss3a`.
    VxAce,
    /// RPG Maker VX: `.rvdata` Marshal data, `Game.rgss2a`.
    Vx,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mv => "mv",
            Self::Mz => "mz",
            Self::VxAce => "vxace",
            Self::Vx => "vx",
        }
    }

    /// Whether the database is stored as JSON.
    #[inline]
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Mv | Self::Mz)
    }

    /// Data file extensions, most preferred first.
    pub fn data_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Mv | Self::Mz => &["json"],
            Self::VxAce => &["rvdata2"],
            Self::Vx => &["rvdata2", "rvdata"],
        }
    }

    /// Archive file names, most preferred first.
    pub fn archive_names(&self) -> &'static [&'static str] {
        match self {
            Self::Mv | Self::Mz => &[],
            Self::VxAce => &["Game.rgss3a"],
            Self::Vx => &["Game.rgss2a", "Game.rgssad"],
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mv" => Ok(Self::Mv),
            "mz" => Ok(Self::Mz),
            "vxace" | "vx-ace" | "ace" => Ok(Self::VxAce),
            "vx" => Ok(Self::Vx),
            other => Err(format!("unknown engine '{other}' (expected mv, mz, vxace or vx)")),
        }
    }
}

/// Where a project's data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub engine: Engine,
    /// Game root (the directory holding the executable).
    pub root: PathBuf,
    /// Directory data files are read from on disk. May not exist when
    /// everything is packed into the archive.
    pub data_dir: PathBuf,
    pub archive: Option<PathBuf>,
}

/// Identify the project at `path`.
///
/// `path` may be the game root, a file inside it (typically `Game.exe`), or the
/// data directory itself.
pub fn discover(path: &Path) -> Result<Discovery> {
    let root = project_root(path);

    if let Some(found) = discover_json(&root) {
        return Ok(found);
    }
    for engine in [Engine::VxAce, Engine::Vx] {
        if let Some(found) = discover_marshal(&root, engine) {
            return Ok(found);
        }
    }
    Err(Error::NotAProject(path.to_path_buf()))
}

/// Layout for an explicitly chosen engine, skipping detection.
pub fn discover_as(path: &Path, engine: Engine) -> Result<Discovery> {
    let root = project_root(path);
    let found = if engine.is_json() {
        discover_json(&root).map(|found| Discovery { engine, ..found })
    } else {
        discover_marshal(&root, engine)
    };
    found.ok_or_else(|| Error::NotAProject(path.to_path_buf()))
}

fn project_root(path: &Path) -> PathBuf {
    if path.is_file() {
        return path.parent().map(Path::to_path_buf).unwrap_or_default();
    }
    let is_data_dir = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case("data"));
    if is_data_dir {
        if let Some(parent) = path.parent() {
            let is_www = parent.file_name().is_some_and(|name| name == "www");
            return match (is_www, parent.parent()) {
                (true, Some(grandparent)) => grandparent.to_path_buf(),
                _ => parent.to_path_buf(),
            };
        }
    }
    path.to_path_buf()
}

fn discover_json(root: &Path) -> Option<Discovery> {
    let data_dir = [root.join("www").join("data"), root.join("data")]
        .into_iter()
        .find(|dir| dir.join("MapInfos.json").is_file())?;

    let has_script = |name: &str| root.join("js").join(name).is_file() || root.join("www/js").join(name).is_file();
    let engine = if has_script("rmmz_core.js") {
        Engine::Mz
    } else if has_script("rpg_core.js") || data_dir.starts_with(root.join("www")) {
        Engine::Mv
    } else {
        Engine::Mz
    };

    Some(Discovery {
        engine,
        root: root.to_path_buf(),
        data_dir,
        archive: None,
    })
}

fn discover_marshal(root: &Path, engine: Engine) -> Option<Discovery> {
    let data_dir = root.join("Data");
    let archive = engine
        .archive_names()
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file());

    // VX projects converted in Ace keep `.rvdata2` files, so only Ace claims them.
    let extension = match engine {
        Engine::VxAce => "rvdata2",
        _ => "rvdata",
    };
    let has_data = data_dir.join(format!("MapInfos.{extension}")).is_file() || has_numbered_maps(&data_dir, extension);

    (archive.is_some() || has_data).then(|| Discovery {
        engine,
        root: root.to_path_buf(),
        data_dir,
        archive,
    })
}

fn has_numbered_maps(data_dir: &Path, extension: &str) -> bool {
    let Some(dir) = data_dir.to_str() else {
        return false;
    };
    let pattern = format!("{}/Map[0-9][0-9][0-9].{extension}", glob::Pattern::escape(dir));
    glob::glob(&pattern).is_ok_and(|mut paths| paths.any(|p| p.is_ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_mv_layout() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "www/data/MapInfos.json");
        touch(dir.path(), "www/js/rpg_core.js");
        touch(dir.path(), "Game.exe");

        let found = discover(&dir.path().join("Game.exe")).unwrap();
        assert_eq!(found.engine, Engine::Mv);
        assert_eq!(found.data_dir, dir.path().join("www/data"));
        assert_eq!(found.root, dir.path());
    }

    #[test]
    fn test_mz_layout_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "data/MapInfos.json");
        touch(dir.path(), "js/rmmz_core.js");

        let found = discover(&dir.path().join("data")).unwrap();
        assert_eq!(found.engine, Engine::Mz);
        assert_eq!(found.root, dir.path());
    }

    #[test]
    fn test_vx_ace_archive_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Game.rgss3a");

        let found = discover(dir.path()).unwrap();
        assert_eq!(found.engine, Engine::VxAce);
        assert_eq!(found.archive, Some(dir.path().join("Game.rgss3a")));
    }

    #[test]
    fn test_vx_loose_maps() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Data/Map001.rvdata");

        let found = discover(dir.path()).unwrap();
        assert_eq!(found.engine, Engine::Vx);
        assert_eq!(found.archive, None);
    }

    #[test]
    fn test_not_a_project() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "readme.txt");
        assert!(matches!(discover(dir.path()), Err(Error::NotAProject(_))));
    }

    #[test]
    fn test_engine_parse() {
        assert_eq!("VXAce".parse::<Engine>(), Ok(Engine::VxAce));
        assert_eq!(Engine::Mz.to_string(), "mz");
        assert!("xp".parse::<Engine>().is_err());
    }
}
