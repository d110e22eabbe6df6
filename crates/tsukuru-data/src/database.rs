//! The decoded database.

use serde::Serialize;
use tsukuru_common::Loaded;

use crate::id_table::IdTable;
use crate::model::{
    Actor, Armor, Class, CommonEvent, Enemy, Item, MapInfo, Record, Skill, State, SystemRecord, Tileset, Troop,
    Weapon,
};
use crate::reference::{NameLookup, RefKind, Reference};
use crate::tree::MapTree;

/// Every database collection of a project, plus system settings and the map index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Database {
    pub system: SystemRecord,
    pub map_infos: IdTable<MapInfo>,
    pub items: IdTable<Item>,
    pub weapons: IdTable<Weapon>,
    pub armors: IdTable<Armor>,
    pub skills: IdTable<Skill>,
    pub enemies: IdTable<Enemy>,
    pub troops: IdTable<Troop>,
    pub states: IdTable<State>,
    pub actors: IdTable<Actor>,
    pub classes: IdTable<Class>,
    pub common_events: IdTable<CommonEvent>,
    pub tilesets: IdTable<Tileset>,
}

impl Database {
    /// Map hierarchy computed from the map index.
    pub fn map_tree(&self) -> Loaded<MapTree> {
        MapTree::build(&self.map_infos)
    }
}

fn named<T: Record>(table: &IdTable<T>, id: i32) -> Option<&str> {
    table.get(id).map(|r| r.name().trim()).filter(|name| !name.is_empty())
}

impl NameLookup for Database {
    fn name_of(&self, kind: RefKind, id: i32) -> Option<&str> {
        match kind {
            RefKind::Item => named(&self.items, id),
            RefKind::Weapon => named(&self.weapons, id),
            RefKind::Armor => named(&self.armors, id),
            RefKind::Skill => named(&self.skills, id),
            RefKind::Enemy => named(&self.enemies, id),
            RefKind::Troop => named(&self.troops, id),
            RefKind::State => named(&self.states, id),
            RefKind::Actor => named(&self.actors, id),
            RefKind::Map | RefKind::Encounter => named(&self.map_infos, id),
            RefKind::CommonEvent => named(&self.common_events, id),
            RefKind::Switch => self.system.switch_name(id),
            RefKind::Variable => self.system.variable_name(id),
            RefKind::Element => self.system.element_name(id),
        }
    }

    fn goods_names(&self) -> Vec<(Reference, &str)> {
        let items = self.items.iter().map(|r| (Reference::new(RefKind::Item, r.id), r.name.trim()));
        let weapons = self.weapons.iter().map(|r| (Reference::new(RefKind::Weapon, r.id), r.name.trim()));
        let armors = self.armors.iter().map(|r| (Reference::new(RefKind::Armor, r.id), r.name.trim()));
        items
            .chain(weapons)
            .chain(armors)
            .filter(|(_, name)| !name.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsukuru_common::Warnings;

    #[test]
    fn test_name_lookup() {
        let mut warnings = Warnings::new();
        let mut db = Database::default();
        db.items.insert(
            Item {
                id: 1,
                name: "Potion".into(),
                ..Default::default()
            },
            "Items",
            &mut warnings,
        );
        db.weapons.insert(
            Weapon {
                id: 2,
                name: " ".into(),
                ..Default::default()
            },
            "Weapons",
            &mut warnings,
        );
        db.system.variables = vec!["".into(), "Gold found".into()];

        assert_eq!(db.name_of(RefKind::Item, 1), Some("Potion"));
        assert_eq!(db.name_of(RefKind::Item, 7), None);
        assert_eq!(db.name_of(RefKind::Weapon, 2), None);
        assert_eq!(db.name_of(RefKind::Variable, 1), Some("Gold found"));
        assert_eq!(db.goods_names(), vec![(Reference::new(RefKind::Item, 1), "Potion")]);
    }
}
