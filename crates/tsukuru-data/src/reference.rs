//! Typed pointers into the database.

use std::fmt;

use serde::Serialize;

/// What a [`Reference`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefKind {
    Item,
    Weapon,
    Armor,
    Skill,
    Enemy,
    Troop,
    /// A map's random encounter table; the id is the map id.
    Encounter,
    State,
    Actor,
    Map,
    CommonEvent,
    Switch,
    Variable,
    Element,
}

impl RefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Weapon => "weapon",
            Self::Armor => "armor",
            Self::Skill => "skill",
            Self::Enemy => "enemy",
            Self::Troop => "troop",
            Self::Encounter => "encounter",
            Self::State => "state",
            Self::Actor => "actor",
            Self::Map => "map",
            Self::CommonEvent => "common-event",
            Self::Switch => "switch",
            Self::Variable => "variable",
            Self::Element => "element",
        }
    }

    /// Item, weapon or armor kind for a drop/shop/condition kind code
    /// (0 item, 1 weapon, 2 armor).
    pub fn from_goods_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Item),
            1 => Some(Self::Weapon),
            2 => Some(Self::Armor),
            _ => None,
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A database id found while decoding, resolved later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Reference {
    pub kind: RefKind,
    pub id: i32,
}

impl Reference {
    #[inline]
    pub const fn new(kind: RefKind, id: i32) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Name-by-kind-and-id lookup.
pub trait NameLookup {
    /// Display name of the target, `None` when it does not exist or is unnamed.
    fn name_of(&self, kind: RefKind, id: i32) -> Option<&str>;

    /// Every named item, weapon and armor, for matching names in text.
    fn goods_names(&self) -> Vec<(Reference, &str)>;

    fn resolve_name(&self, reference: Reference) -> Option<&str> {
        self.name_of(reference.kind, reference.id)
    }
}
