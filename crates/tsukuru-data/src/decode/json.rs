//! MV/MZ JSON data files.

use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use tsukuru_common::text::strip_utf8_bom;

use super::{bad_root, Rows};
use crate::handle::DataFile;
use crate::model::{EventRecord, MapInfo, MapRecord, SystemRecord};
use crate::Result;

fn parse(file: &DataFile) -> Result<Json> {
    Ok(serde_json::from_slice(strip_utf8_bom(&file.bytes))?)
}

/// Decode each non-null element of a top-level array on its own.
pub(super) fn collection<T: DeserializeOwned>(file: &DataFile) -> Result<Rows<T>> {
    let Json::Array(elements) = parse(file)? else {
        return Err(bad_root(file, "an array"));
    };
    Ok(elements
        .into_iter()
        .enumerate()
        .filter(|(_, element)| !element.is_null())
        .map(|(index, element)| (index, serde_json::from_value(element).map_err(Into::into)))
        .collect())
}

pub(super) fn map_infos(file: &DataFile) -> Result<Rows<MapInfo>> {
    collection(file)
}

pub(super) fn system(file: &DataFile) -> Result<SystemRecord> {
    let root = parse(file)?;
    if !root.is_object() {
        return Err(bad_root(file, "an object"));
    }
    Ok(serde_json::from_value(root)?)
}

/// A map and its events, decoded separately so one bad event only drops itself.
pub(super) fn map(file: &DataFile) -> Result<(MapRecord, Rows<EventRecord>)> {
    let mut root = parse(file)?;
    let Some(object) = root.as_object_mut() else {
        return Err(bad_root(file, "an object"));
    };
    let events = match object.remove("events") {
        Some(Json::Array(events)) => events,
        _ => Vec::new(),
    };

    let map: MapRecord = serde_json::from_value(root)?;
    let events = events
        .into_iter()
        .enumerate()
        .filter(|(_, event)| !event.is_null())
        .map(|(index, event)| (index, serde_json::from_value(event).map_err(Into::into)))
        .collect();
    Ok((map, events))
}
