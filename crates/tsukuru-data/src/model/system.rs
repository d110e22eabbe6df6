//! Project-wide settings.

use serde::{Deserialize, Serialize};

/// Equipment slot names used when the data does not carry any (VX).
pub const DEFAULT_EQUIP_TYPES: [&str; 6] = ["", "Weapon", "Shield", "Head", "Body", "Accessory"];

/// The `System` data file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SystemRecord {
    pub game_title: String,
    pub currency_unit: String,
    /// Names indexed by id; slot 0 is unused.
    pub switches: Vec<String>,
    pub variables: Vec<String>,
    pub elements: Vec<String>,
    pub weapon_types: Vec<String>,
    pub armor_types: Vec<String>,
    pub equip_types: Vec<String>,
    pub skill_types: Vec<String>,
    /// Hex key for obfuscated resources (MV/MZ only).
    pub encryption_key: Option<String>,
    pub has_encrypted_images: bool,
    pub has_encrypted_audio: bool,
    pub start_map_id: i32,
    pub start_x: i32,
    pub start_y: i32,
    pub party_members: Vec<i32>,
}

impl SystemRecord {
    pub fn switch_name(&self, id: i32) -> Option<&str> {
        indexed_name(&self.switches, id)
    }

    pub fn variable_name(&self, id: i32) -> Option<&str> {
        indexed_name(&self.variables, id)
    }

    pub fn element_name(&self, id: i32) -> Option<&str> {
        indexed_name(&self.elements, id)
    }

    pub fn skill_type_name(&self, id: i32) -> Option<&str> {
        indexed_name(&self.skill_types, id)
    }

    pub fn weapon_type_name(&self, id: i32) -> Option<&str> {
        indexed_name(&self.weapon_types, id)
    }

    pub fn armor_type_name(&self, id: i32) -> Option<&str> {
        indexed_name(&self.armor_types, id)
    }

    pub fn equip_type_name(&self, id: i32) -> Option<&str> {
        indexed_name(&self.equip_types, id)
    }

    /// Fill in equipment slot names when the data left them empty.
    pub(crate) fn apply_defaults(&mut self) {
        if self.equip_types.is_empty() {
            self.equip_types = DEFAULT_EQUIP_TYPES.iter().map(|s| s.to_string()).collect();
        }
    }
}

/// Name at `id` in a 1-based name list; blank names count as absent.
fn indexed_name(names: &[String], id: i32) -> Option<&str> {
    let index = usize::try_from(id).ok().filter(|&i| i > 0)?;
    names
        .get(index)
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_names() {
        let system = SystemRecord {
            switches: vec!["".into(), "Door open".into(), "  ".into()],
            ..Default::default()
        };
        assert_eq!(system.switch_name(1), Some("Door open"));
        assert_eq!(system.switch_name(2), None);
        assert_eq!(system.switch_name(0), None);
        assert_eq!(system.switch_name(-1), None);
    }

    #[test]
    fn test_default_equip_types() {
        let mut system = SystemRecord::default();
        system.apply_defaults();
        assert_eq!(system.equip_type_name(1), Some("Weapon"));
    }
}
