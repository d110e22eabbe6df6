//! Maps, events and event commands.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

static NULL: Json = Json::Null;

/// One entry of the map index (`MapInfos`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapInfo {
    pub id: i32,
    pub name: String,
    /// 0 for top-level maps.
    pub parent_id: i32,
    pub order: i32,
    pub expanded: bool,
}

/// A sound reference: BGM, BGS, ME or SE.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioFile {
    pub name: String,
    pub volume: i32,
    pub pitch: i32,
    pub pan: i32,
}

/// One row of a map's random encounter table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Encounter {
    pub troop_id: i32,
    pub weight: i32,
    /// Regions the row is limited to; empty means the whole map.
    pub region_set: Vec<i32>,
}

/// A decoded map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapRecord {
    /// From the file name, not the file contents.
    #[serde(skip_deserializing)]
    pub id: i32,
    /// Editor name, taken from the map index.
    #[serde(skip_deserializing)]
    pub name: String,
    pub display_name: String,
    pub tileset_id: i32,
    pub width: i32,
    pub height: i32,
    pub autoplay_bgm: bool,
    pub bgm: AudioFile,
    pub parallax_name: String,
    pub encounter_step: i32,
    pub encounter_list: Vec<Encounter>,
    pub note: String,
    /// Tile ids, x fastest, then y, then layer.
    pub data: Vec<i32>,
    /// Events in id order. Decoded one by one so a bad event only drops itself.
    #[serde(skip_deserializing)]
    pub events: Vec<EventRecord>,
}

impl MapRecord {
    /// Number of tile layers in `data`.
    pub fn layers(&self) -> usize {
        let area = (self.width.max(0) as usize) * (self.height.max(0) as usize);
        if area == 0 {
            0
        } else {
            self.data.len() / area
        }
    }

    /// Tile id at (x, y) on `layer`.
    pub fn tile(&self, x: i32, y: i32, layer: usize) -> Option<i32> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        let (w, h) = (self.width as usize, self.height as usize);
        self.data.get((layer * h + y as usize) * w + x as usize).copied()
    }

    pub fn event(&self, id: i32) -> Option<&EventRecord> {
        self.events.iter().find(|event| event.id == id)
    }
}

/// A map event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventRecord {
    pub id: i32,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub note: String,
    pub pages: Vec<EventPage>,
}

/// One conditional variant of an event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventPage {
    /// 0 action button, 1 player touch, 2 event touch, 3 autorun, 4 parallel.
    pub trigger: i32,
    pub conditions: PageConditions,
    pub image: PageImage,
    pub priority_type: i32,
    #[serde(rename = "list")]
    pub commands: Vec<Command>,
}

/// Appearance conditions of an event page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageConditions {
    pub switch1_valid: bool,
    pub switch1_id: i32,
    pub switch2_valid: bool,
    pub switch2_id: i32,
    pub variable_valid: bool,
    pub variable_id: i32,
    pub variable_value: i32,
    pub self_switch_valid: bool,
    pub self_switch_ch: String,
    pub item_valid: bool,
    pub item_id: i32,
    pub actor_valid: bool,
    pub actor_id: i32,
}

/// Sprite shown for an event page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageImage {
    pub tile_id: i32,
    pub character_name: String,
    pub character_index: i32,
    pub direction: i32,
    pub pattern: i32,
}

impl PageImage {
    pub fn is_empty(&self) -> bool {
        self.tile_id == 0 && self.character_name.is_empty()
    }

    /// Sheets whose name starts with `$` hold a single character.
    pub fn is_big_character(&self) -> bool {
        self.character_name.starts_with('$')
    }
}

/// One raw event command.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Command {
    pub code: i32,
    pub indent: i32,
    pub parameters: Vec<Json>,
}

impl Command {
    pub fn new(code: i32, indent: i32, parameters: Vec<Json>) -> Self {
        Self {
            code,
            indent,
            parameters,
        }
    }

    /// Parameter at `index`, or null.
    pub fn param(&self, index: usize) -> &Json {
        self.parameters.get(index).unwrap_or(&NULL)
    }

    /// Integer parameter. Whole floats are accepted.
    pub fn int(&self, index: usize) -> Option<i64> {
        let value = self.param(index);
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
    }

    /// Integer parameter narrowed to an id, 0 when absent.
    pub fn id(&self, index: usize) -> i32 {
        self.int(index).and_then(|v| i32::try_from(v).ok()).unwrap_or(0)
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.param(index).as_str()
    }

    pub fn flag(&self, index: usize) -> bool {
        match self.param(index) {
            Json::Bool(b) => *b,
            other => other.as_i64().is_some_and(|v| v != 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_params() {
        let cmd: Command = serde_json::from_value(json!({
            "code": 201, "indent": 1, "parameters": [0, 3, 10.0, "x", true]
        }))
        .unwrap();
        assert_eq!(cmd.id(1), 3);
        assert_eq!(cmd.int(2), Some(10));
        assert_eq!(cmd.text(3), Some("x"));
        assert!(cmd.flag(4));
        assert!(cmd.param(9).is_null());
        assert_eq!(cmd.id(9), 0);
    }

    #[test]
    fn test_page_uses_list_field() {
        let page: EventPage = serde_json::from_value(json!({
            "trigger": 3,
            "image": {"characterName": "$Chest", "direction": 2},
            "list": [{"code": 0, "indent": 0, "parameters": []}]
        }))
        .unwrap();
        assert_eq!(page.trigger, 3);
        assert_eq!(page.commands.len(), 1);
        assert!(page.image.is_big_character());
    }

    #[test]
    fn test_tile_indexing() {
        let map = MapRecord {
            width: 2,
            height: 2,
            data: (0..8).collect(),
            ..Default::default()
        };
        assert_eq!(map.layers(), 2);
        assert_eq!(map.tile(1, 0, 1), Some(5));
        assert_eq!(map.tile(2, 0, 0), None);
    }
}
