//! Schema decoders.
//!
//! Each engine family stores the same database in a different serialization.
//! [`SchemaDecoder`] picks the reader once per project and every decode call
//! returns the same unified records.

mod json;
mod marshal;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tsukuru_common::{Loaded, WarningKind, Warnings};

use crate::database::Database;
use crate::engine::Engine;
use crate::handle::{DataFile, ProjectHandle};
use crate::id_table::IdTable;
use crate::model::{MapInfo, MapRecord, Record, SystemRecord};
use crate::{Error, Result};

pub(crate) use marshal::FromMarshal;

/// Serialization family of a project's data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaDecoder {
    /// MV and MZ: one JSON document per file.
    Json,
    /// VX and VX Ace: Ruby Marshal object graphs.
    Marshal,
}

impl SchemaDecoder {
    pub fn for_engine(engine: Engine) -> Self {
        if engine.is_json() {
            Self::Json
        } else {
            Self::Marshal
        }
    }

    /// System settings. A missing or unreadable file gives defaults and a warning.
    pub fn decode_system(self, handle: &ProjectHandle) -> Loaded<SystemRecord> {
        let mut warnings = Warnings::new();
        let decoded = match handle.read_data("System") {
            Ok(Some(file)) => {
                let result = match self {
                    Self::Json => json::system(&file),
                    Self::Marshal => marshal::system(&file),
                };
                result.map_err(|e| (file.name, e))
            }
            Ok(None) => Err(("System".to_string(), Error::MissingRoot("System".into()))),
            Err(e) => Err(("System".to_string(), e)),
        };

        let mut system = match decoded {
            Ok(system) => system,
            Err((context, e)) => {
                warnings.push(e.warning_kind(), context, e.to_string());
                SystemRecord::default()
            }
        };
        system.apply_defaults();
        Loaded::new(system, warnings)
    }

    /// The map index. Every other map lookup goes through it, so a missing or
    /// malformed index fails the load.
    pub fn decode_map_infos(self, handle: &ProjectHandle) -> Result<Loaded<IdTable<MapInfo>>> {
        let file = handle
            .read_data("MapInfos")?
            .ok_or_else(|| Error::MissingRoot("MapInfos".into()))?;
        let rows = match self {
            Self::Json => json::map_infos(&file)?,
            Self::Marshal => marshal::map_infos(&file)?,
        };
        Ok(collect_rows(&file.name, rows))
    }

    /// One map. `info` supplies the id and editor name.
    pub fn decode_map(self, handle: &ProjectHandle, info: &MapInfo) -> Result<Loaded<MapRecord>> {
        let stem = format!("Map{:03}", info.id);
        let file = handle.read_data(&stem)?.ok_or(Error::MissingRoot(stem))?;

        let (mut map, events) = match self {
            Self::Json => json::map(&file)?,
            Self::Marshal => marshal::map(&file)?,
        };
        map.id = info.id;
        map.name = info.name.clone();

        let mut warnings = Warnings::new();
        let mut seen = IdTable::new();
        for (index, event) in events {
            let context = format!("{}#{index}", file.name);
            match event {
                Ok(event) => {
                    seen.insert(event, &context, &mut warnings);
                }
                Err(e) => warnings.push(e.warning_kind(), context, e.to_string()),
            }
        }
        map.events = seen.into_values();
        Ok(Loaded::new(map, warnings))
    }

    /// Every map in the index. A map that fails to decode is left out with a
    /// warning; the rest still load.
    pub fn decode_maps(self, handle: &ProjectHandle, infos: &IdTable<MapInfo>) -> Loaded<BTreeMap<i32, MapRecord>> {
        let decode_one = |info: &MapInfo| (info.id, self.decode_map(handle, info));
        let infos: Vec<&MapInfo> = infos.iter().collect();

        #[cfg(feature = "parallel")]
        let results: Vec<_> = {
            use rayon::prelude::*;
            infos.par_iter().map(|info| decode_one(*info)).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let results: Vec<_> = infos.iter().map(|info| decode_one(*info)).collect();

        let mut warnings = Warnings::new();
        let mut maps = BTreeMap::new();
        for (id, result) in results {
            match result {
                Ok(loaded) => {
                    maps.insert(id, loaded.drain_into(&mut warnings));
                }
                Err(e) => warnings.push(e.warning_kind(), format!("Map{id:03}"), e.to_string()),
            }
        }
        Loaded::new(maps, warnings)
    }

    /// Every database collection, system settings and the map index.
    pub fn decode_catalog(self, handle: &ProjectHandle) -> Result<Loaded<Database>> {
        let mut warnings = Warnings::new();
        let map_infos = self.decode_map_infos(handle)?.drain_into(&mut warnings);
        let system = self.decode_system(handle).drain_into(&mut warnings);

        let mut database = Database {
            system,
            map_infos,
            items: self.collection(handle, "Items")?.drain_into(&mut warnings),
            weapons: self.collection(handle, "Weapons")?.drain_into(&mut warnings),
            armors: self.collection(handle, "Armors")?.drain_into(&mut warnings),
            skills: self.collection(handle, "Skills")?.drain_into(&mut warnings),
            enemies: self.collection(handle, "Enemies")?.drain_into(&mut warnings),
            troops: self.collection(handle, "Troops")?.drain_into(&mut warnings),
            states: self.collection(handle, "States")?.drain_into(&mut warnings),
            actors: self.collection(handle, "Actors")?.drain_into(&mut warnings),
            classes: self.collection(handle, "Classes")?.drain_into(&mut warnings),
            common_events: self.collection(handle, "CommonEvents")?.drain_into(&mut warnings),
            tilesets: IdTable::new(),
        };
        // VX has no tileset database.
        if handle.engine() != Engine::Vx || handle.has_data("Tilesets") {
            database.tilesets = self.collection(handle, "Tilesets")?.drain_into(&mut warnings);
        }

        tracing::debug!(
            items = database.items.len(),
            skills = database.skills.len(),
            enemies = database.enemies.len(),
            troops = database.troops.len(),
            maps = database.map_infos.len(),
            "catalog_decoded"
        );
        Ok(Loaded::new(database, warnings))
    }

    /// A database collection. A missing file gives an empty table and a
    /// warning; a file whose root is not a list fails the load.
    fn collection<T>(self, handle: &ProjectHandle, stem: &str) -> Result<Loaded<IdTable<T>>>
    where
        T: Record + DeserializeOwned + FromMarshal,
    {
        let file = match handle.read_data(stem) {
            Ok(Some(file)) => file,
            Ok(None) => {
                let mut warnings = Warnings::new();
                warnings.push(WarningKind::Io, stem, "data file is missing");
                return Ok(Loaded::new(IdTable::new(), warnings));
            }
            Err(e) => {
                let mut warnings = Warnings::new();
                warnings.push(e.warning_kind(), stem, e.to_string());
                return Ok(Loaded::new(IdTable::new(), warnings));
            }
        };

        let rows = match self {
            Self::Json => json::collection::<T>(&file)?,
            Self::Marshal => marshal::collection::<T>(&file)?,
        };
        Ok(collect_rows(&file.name, rows))
    }
}

/// Per-record decode outcomes, tagged with their position in the file.
pub(crate) type Rows<T> = Vec<(usize, Result<T>)>;

/// Insert decoded rows into a table, turning failures and duplicates into warnings.
fn collect_rows<T: Record>(file_name: &str, rows: Rows<T>) -> Loaded<IdTable<T>> {
    let mut warnings = Warnings::new();
    let mut table = IdTable::new();
    for (index, row) in rows {
        let context = format!("{file_name}#{index}");
        match row {
            Ok(mut record) => {
                record.normalize();
                table.insert(record, &context, &mut warnings);
            }
            Err(e) => warnings.push(e.warning_kind(), context, e.to_string()),
        }
    }
    Loaded::new(table, warnings)
}

/// Error for a root of the wrong shape.
pub(crate) fn bad_root(file: &DataFile, expected: &str) -> Error {
    Error::schema(file.name.clone(), format!("root is not {expected}"))
}
