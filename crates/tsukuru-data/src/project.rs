//! Tolerant whole-project loading.

use std::collections::BTreeMap;

use serde::Serialize;
use tsukuru_common::{Loaded, Warnings};

use crate::database::Database;
use crate::engine::Engine;
use crate::handle::ProjectHandle;
use crate::model::MapRecord;
use crate::Result;

/// Everything decoded from a project's data files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub engine: Engine,
    pub database: Database,
    /// Decoded maps by id. Maps listed in the index that failed to decode are absent.
    pub maps: BTreeMap<i32, MapRecord>,
}

impl Project {
    pub fn map(&self, id: i32) -> Option<&MapRecord> {
        self.maps.get(&id)
    }
}

/// Decode the database and every map of an opened project.
///
/// Fails only when the map index is missing or malformed, or a collection
/// file has a root of the wrong shape. Everything else is recorded as a
/// warning and loading continues.
pub fn load_project(handle: &ProjectHandle) -> Result<Loaded<Project>> {
    let decoder = handle.decoder();
    let mut warnings = Warnings::new();
    warnings.extend(handle.warnings().clone());

    let database = decoder.decode_catalog(handle)?.drain_into(&mut warnings);
    let maps = decoder.decode_maps(handle, &database.map_infos).drain_into(&mut warnings);

    tracing::debug!(
        engine = %handle.engine(),
        maps = maps.len(),
        indexed = database.map_infos.len(),
        warnings = warnings.len(),
        "project_loaded"
    );

    Ok(Loaded::new(
        Project {
            engine: handle.engine(),
            database,
            maps,
        },
        warnings,
    ))
}
