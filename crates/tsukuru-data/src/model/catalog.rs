//! Database records: items, equipment, skills, battlers and friends.

use serde::{Deserialize, Serialize};

use super::map::Command;

/// Passive modifier on equipment, actors, classes, enemies and states.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Trait {
    pub code: i32,
    pub data_id: i32,
    pub value: f64,
}

/// Effect applied when an item or skill hits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Effect {
    pub code: i32,
    pub data_id: i32,
    pub value1: f64,
    pub value2: f64,
}

/// Formula-based damage (MV, MZ, VX Ace).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Damage {
    /// 0 none, 1 HP damage, 2 MP damage, 3 HP recover, 4 MP recover, 5 HP drain, 6 MP drain.
    #[serde(rename = "type")]
    pub kind: i32,
    /// -1 uses the attacker's normal attack element.
    pub element_id: i32,
    pub formula: String,
    pub variance: i32,
    pub critical: bool,
}

/// VX's fixed damage parameters, used before formulas existed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyDamage {
    pub base_damage: i32,
    pub atk_f: i32,
    pub spi_f: i32,
    pub variance: i32,
    pub element_set: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub icon_index: i32,
    pub note: String,
    /// 1 regular, 2 key item, 3 hidden A, 4 hidden B.
    pub itype_id: i32,
    pub price: i32,
    pub consumable: bool,
    pub scope: i32,
    pub occasion: i32,
    pub speed: i32,
    pub success_rate: i32,
    pub repeats: i32,
    pub tp_gain: i32,
    pub hit_type: i32,
    pub animation_id: i32,
    pub damage: Damage,
    pub effects: Vec<Effect>,
}

impl Item {
    pub fn is_key_item(&self) -> bool {
        self.itype_id == 2
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Weapon {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub icon_index: i32,
    pub note: String,
    pub wtype_id: i32,
    pub etype_id: i32,
    pub price: i32,
    pub animation_id: i32,
    /// mhp, mmp, atk, def, mat, mdf, agi, luk.
    pub params: Vec<i32>,
    pub traits: Vec<Trait>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Armor {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub icon_index: i32,
    pub note: String,
    pub atype_id: i32,
    pub etype_id: i32,
    pub price: i32,
    pub params: Vec<i32>,
    pub traits: Vec<Trait>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Skill {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub icon_index: i32,
    pub note: String,
    pub stype_id: i32,
    pub scope: i32,
    pub occasion: i32,
    pub mp_cost: i32,
    pub tp_cost: i32,
    pub tp_gain: i32,
    pub speed: i32,
    pub success_rate: i32,
    pub repeats: i32,
    pub hit_type: i32,
    pub animation_id: i32,
    pub damage: Damage,
    /// Present only for VX data.
    pub legacy_damage: Option<LegacyDamage>,
    pub effects: Vec<Effect>,
    pub message1: String,
    pub message2: String,
}

/// One possible enemy drop.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DropItem {
    /// 0 none, 1 item, 2 weapon, 3 armor.
    pub kind: i32,
    pub data_id: i32,
    /// Drop chance is 1 / denominator.
    pub denominator: i32,
}

/// One entry of an enemy's action pattern.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnemyAction {
    pub skill_id: i32,
    pub rating: i32,
    pub condition_type: i32,
    pub condition_param1: f64,
    pub condition_param2: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Enemy {
    pub id: i32,
    pub name: String,
    pub note: String,
    pub battler_name: String,
    pub battler_hue: i32,
    pub params: Vec<i32>,
    pub exp: i32,
    pub gold: i32,
    pub drop_items: Vec<DropItem>,
    pub actions: Vec<EnemyAction>,
    pub traits: Vec<Trait>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TroopMember {
    pub enemy_id: i32,
    pub x: i32,
    pub y: i32,
    /// Appears only when revealed by a battle event.
    pub hidden: bool,
}

/// A battle event page of a troop.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TroopPage {
    pub span: i32,
    #[serde(rename = "list")]
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Troop {
    pub id: i32,
    pub name: String,
    pub members: Vec<TroopMember>,
    pub pages: Vec<TroopPage>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct State {
    pub id: i32,
    pub name: String,
    pub icon_index: i32,
    pub note: String,
    pub restriction: i32,
    pub priority: i32,
    pub min_turns: i32,
    pub max_turns: i32,
    pub remove_at_battle_end: bool,
    pub message1: String,
    pub traits: Vec<Trait>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Actor {
    pub id: i32,
    pub name: String,
    pub nickname: String,
    pub class_id: i32,
    pub initial_level: i32,
    pub max_level: i32,
    pub face_name: String,
    pub face_index: i32,
    pub character_name: String,
    pub character_index: i32,
    pub equips: Vec<i32>,
    pub profile: String,
    pub note: String,
    pub traits: Vec<Trait>,
}

/// A skill learned at a level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Learning {
    pub level: i32,
    pub skill_id: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Class {
    pub id: i32,
    pub name: String,
    pub note: String,
    pub exp_params: Vec<i32>,
    /// Per parameter, the value at each level.
    pub params: Vec<Vec<i32>>,
    pub learnings: Vec<Learning>,
    pub traits: Vec<Trait>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommonEvent {
    pub id: i32,
    pub name: String,
    /// 0 none, 1 autorun, 2 parallel.
    pub trigger: i32,
    pub switch_id: i32,
    #[serde(rename = "list")]
    pub commands: Vec<Command>,
}

/// Number of tileset image slots (A1-A5, B-E).
pub const TILESET_SLOTS: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tileset {
    pub id: i32,
    pub name: String,
    pub note: String,
    pub mode: i32,
    /// Always `TILESET_SLOTS` long once decoded.
    pub tileset_names: Vec<String>,
    /// Passage and terrain flags by tile id.
    pub flags: Vec<i32>,
}

impl Tileset {
    /// Pad or cut `tileset_names` to the fixed slot count.
    pub fn normalize_names(&mut self) {
        self.tileset_names.resize(TILESET_SLOTS, String::new());
        for name in &mut self.tileset_names {
            let trimmed = name.trim();
            if trimmed.len() != name.len() {
                *name = trimmed.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_skill_damage_type_field() {
        let skill: Skill = serde_json::from_value(json!({
            "id": 7,
            "name": "Fire",
            "damage": {"type": 1, "elementId": 2, "formula": "100 + a.mat * 2 - b.mdf * 2", "variance": 20, "critical": false},
            "effects": [{"code": 21, "dataId": 4, "value1": 0.5, "value2": 0}]
        }))
        .unwrap();
        assert_eq!(skill.damage.kind, 1);
        assert_eq!(skill.damage.element_id, 2);
        assert_eq!(skill.effects[0].value1, 0.5);
        assert!(skill.legacy_damage.is_none());
    }

    #[test]
    fn test_tileset_names_padded() {
        let mut tileset = Tileset {
            tileset_names: vec![" A1 ".into(), "A2".into()],
            ..Default::default()
        };
        tileset.normalize_names();
        assert_eq!(tileset.tileset_names.len(), TILESET_SLOTS);
        assert_eq!(tileset.tileset_names[0], "A1");
        assert_eq!(tileset.tileset_names[8], "");
    }
}
