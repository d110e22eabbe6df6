//! Unified project records.
//!
//! Field names follow the MV/MZ JSON files, which is also the shape the
//! Marshal decoder normalizes the legacy engines into.

mod catalog;
mod map;
mod system;

pub use catalog::{
    Actor, Armor, Class, CommonEvent, Damage, DropItem, Effect, Enemy, EnemyAction, Item, Learning, LegacyDamage,
    Skill, State, Tileset, Trait, Troop, TroopMember, TroopPage, Weapon, TILESET_SLOTS,
};
pub use map::{AudioFile, Command, Encounter, EventPage, EventRecord, MapInfo, MapRecord, PageConditions, PageImage};
pub use system::{SystemRecord, DEFAULT_EQUIP_TYPES};

/// A record addressed by a database id.
pub trait Record {
    fn id(&self) -> i32;

    fn name(&self) -> &str;

    /// Fix up fields after decoding. Most records need nothing.
    fn normalize(&mut self) {}
}

macro_rules! impl_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Record for $ty {
                #[inline]
                fn id(&self) -> i32 {
                    self.id
                }

                #[inline]
                fn name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

impl_record!(
    MapInfo,
    MapRecord,
    EventRecord,
    Item,
    Weapon,
    Armor,
    Skill,
    Enemy,
    Troop,
    State,
    Actor,
    Class,
    CommonEvent,
);

impl Record for Tileset {
    #[inline]
    fn id(&self) -> i32 {
        self.id
    }

    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    fn normalize(&mut self) {
        self.normalize_names();
    }
}
