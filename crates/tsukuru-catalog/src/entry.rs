//! Catalog entries: one browsable card per named database record.

use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;
use serde::Serialize;
use tsukuru_data::model::{Armor, Damage, Enemy, Item, LegacyDamage, Skill, Troop, Weapon};
use tsukuru_data::{RefKind, Reference};

use crate::describe::{describe_effect, describe_trait, element, name, Line};
use crate::formula::explain_formula;
use crate::labels::{self, term};
use crate::resolve::{ResolvedReference, Resolver};

type FxHashSet<T> = hashbrown::HashSet<T, BuildHasherDefault<FxHasher>>;

/// Kinds that have catalog categories.
pub const CATALOG_KINDS: [RefKind; 6] = [
    RefKind::Item,
    RefKind::Weapon,
    RefKind::Armor,
    RefKind::Skill,
    RefKind::Enemy,
    RefKind::Troop,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub kind: RefKind,
    pub id: i32,
    pub name: String,
    pub icon_index: Option<i32>,
    pub description: String,
    /// Editor fields in display order.
    pub attributes: Vec<Attribute>,
    /// Traits, effects, drops, actions or members in words.
    pub details: Vec<String>,
    /// Every record the entry points at, resolved or not.
    pub references: Vec<ResolvedReference>,
}

impl CatalogEntry {
    pub fn reference(&self) -> Reference {
        Reference::new(self.kind, self.id)
    }

    pub fn attribute(&self, label: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.label == label)
            .map(|a| a.value.as_str())
    }
}

/// Records left unnamed, and enemy names used as editor separators, are not catalogued.
fn is_listed(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && !name.starts_with("ーー")
}

struct Builder<'a> {
    resolver: Resolver<'a>,
    entry: CatalogEntry,
    seen: FxHashSet<Reference>,
}

impl<'a> Builder<'a> {
    fn new(resolver: Resolver<'a>, kind: RefKind, id: i32, name: &str) -> Self {
        Self {
            resolver,
            entry: CatalogEntry {
                kind,
                id,
                name: name.trim().to_owned(),
                icon_index: None,
                description: String::new(),
                attributes: Vec::new(),
                details: Vec::new(),
                references: Vec::new(),
            },
            seen: FxHashSet::default(),
        }
    }

    fn icon(mut self, index: i32, description: &str) -> Self {
        self.entry.icon_index = Some(index);
        self.entry.description = description.to_owned();
        self
    }

    fn attr(&mut self, label: &'static str, value: impl ToString) {
        self.entry.attributes.push(Attribute {
            label,
            value: value.to_string(),
        });
    }

    fn refer(&mut self, reference: Reference) {
        if reference.id > 0 && self.seen.insert(reference) {
            self.entry.references.push(self.resolver.resolve(&reference));
        }
    }

    fn line(&mut self, line: Line) {
        for reference in line.references {
            self.refer(reference);
        }
        self.entry.details.push(line.text);
    }

    fn params(&mut self, params: &[i32]) {
        for (index, value) in params.iter().enumerate().take(labels::PARAMS.len()) {
            if *value != 0 {
                self.entry.attributes.push(Attribute {
                    label: labels::PARAMS[index],
                    value: format!("{value:+}"),
                });
            }
        }
    }

    fn damage(&mut self, damage: &Damage) {
        if damage.kind == 0 {
            return;
        }
        let db = self.resolver.database();
        self.attr("Damage Type", labels::damage_type(damage.kind));
        self.attr("Element", element(db, damage.element_id));
        let formula = damage.formula.trim();
        if !formula.is_empty() {
            self.attr("Formula", formula);
            self.attr("Formula (explained)", explain_formula(formula, db));
        }
        self.attr("Variance", format!("{}%", damage.variance));
        self.attr("Critical", if damage.critical { "Yes" } else { "No" });
    }

    fn legacy_damage(&mut self, legacy: &LegacyDamage) {
        let db = self.resolver.database();
        let elements: Vec<String> = legacy.element_set.iter().map(|&id| element(db, id)).collect();
        self.attr("Base Damage", legacy.base_damage);
        self.attr("ATK Factor", legacy.atk_f);
        self.attr("SPI Factor", legacy.spi_f);
        self.attr("Variance", legacy.variance);
        if !elements.is_empty() {
            self.attr("Elements", elements.join(", "));
        }
    }

    fn finish(self) -> CatalogEntry {
        self.entry
    }
}

pub(crate) fn item_entry(item: &Item, resolver: Resolver<'_>) -> Option<CatalogEntry> {
    if !is_listed(&item.name) {
        return None;
    }
    let db = resolver.database();
    let mut b = Builder::new(resolver, RefKind::Item, item.id, &item.name).icon(item.icon_index, &item.description);
    b.attr("Type", labels::item_type(item.itype_id));
    b.attr("Price", item.price);
    b.attr("Consumable", if item.consumable { "Yes" } else { "No" });
    b.attr("Scope", labels::scope(item.scope));
    b.attr("Occasion", labels::occasion(item.occasion));
    b.damage(&item.damage);
    for effect in &item.effects {
        b.line(describe_effect(effect, db));
    }
    Some(b.finish())
}

pub(crate) fn weapon_entry(weapon: &Weapon, resolver: Resolver<'_>) -> Option<CatalogEntry> {
    if !is_listed(&weapon.name) {
        return None;
    }
    let db = resolver.database();
    let mut b =
        Builder::new(resolver, RefKind::Weapon, weapon.id, &weapon.name).icon(weapon.icon_index, &weapon.description);
    b.attr("Weapon Type", term(&db.system.weapon_types, weapon.wtype_id));
    b.attr("Equip Type", term(&db.system.equip_types, weapon.etype_id));
    b.attr("Price", weapon.price);
    b.params(&weapon.params);
    for t in &weapon.traits {
        b.line(describe_trait(t, db));
    }
    Some(b.finish())
}

pub(crate) fn armor_entry(armor: &Armor, resolver: Resolver<'_>) -> Option<CatalogEntry> {
    if !is_listed(&armor.name) {
        return None;
    }
    let db = resolver.database();
    let mut b =
        Builder::new(resolver, RefKind::Armor, armor.id, &armor.name).icon(armor.icon_index, &armor.description);
    b.attr("Armor Type", term(&db.system.armor_types, armor.atype_id));
    b.attr("Equip Type", term(&db.system.equip_types, armor.etype_id));
    b.attr("Price", armor.price);
    b.params(&armor.params);
    for t in &armor.traits {
        b.line(describe_trait(t, db));
    }
    Some(b.finish())
}

pub(crate) fn skill_entry(skill: &Skill, resolver: Resolver<'_>) -> Option<CatalogEntry> {
    if !is_listed(&skill.name) {
        return None;
    }
    let db = resolver.database();
    let mut b =
        Builder::new(resolver, RefKind::Skill, skill.id, &skill.name).icon(skill.icon_index, &skill.description);
    b.attr("Skill Type", term(&db.system.skill_types, skill.stype_id));
    b.attr("Scope", labels::scope(skill.scope));
    b.attr("Occasion", labels::occasion(skill.occasion));
    b.attr("Hit Type", labels::hit_type(skill.hit_type));
    b.attr("MP Cost", skill.mp_cost);
    b.attr("TP Cost", skill.tp_cost);
    b.attr("Speed", skill.speed);
    b.attr("Success", format!("{}%", skill.success_rate));
    b.attr("Repeats", skill.repeats.max(1));
    match &skill.legacy_damage {
        Some(legacy) => b.legacy_damage(legacy),
        None => b.damage(&skill.damage),
    }
    for effect in &skill.effects {
        b.line(describe_effect(effect, db));
    }
    Some(b.finish())
}

pub(crate) fn enemy_entry(enemy: &Enemy, resolver: Resolver<'_>) -> Option<CatalogEntry> {
    if !is_listed(&enemy.name) {
        return None;
    }
    let db = resolver.database();
    let mut b = Builder::new(resolver, RefKind::Enemy, enemy.id, &enemy.name);
    b.params(&enemy.params);
    b.attr("EXP", enemy.exp);
    b.attr("Gold", enemy.gold);
    if !enemy.battler_name.is_empty() {
        b.attr("Battler", &enemy.battler_name);
    }
    for drop in &enemy.drop_items {
        // Drop kinds are 1 item, 2 weapon, 3 armor; 0 is an empty slot.
        let Some(kind) = RefKind::from_goods_code(i64::from(drop.kind) - 1) else {
            continue;
        };
        let rate = if drop.denominator > 1 {
            format!("1/{}", drop.denominator)
        } else {
            "100%".to_owned()
        };
        b.line(Line {
            text: format!("Drop {kind}: {} ({rate})", name(db, kind, drop.data_id)),
            references: vec![Reference::new(kind, drop.data_id)],
        });
    }
    for action in &enemy.actions {
        b.line(Line {
            text: format!(
                "Action: {} (rating {})",
                name(db, RefKind::Skill, action.skill_id),
                action.rating
            ),
            references: vec![Reference::new(RefKind::Skill, action.skill_id)],
        });
    }
    for t in &enemy.traits {
        b.line(describe_trait(t, db));
    }
    Some(b.finish())
}

pub(crate) fn troop_entry(troop: &Troop, resolver: Resolver<'_>) -> Option<CatalogEntry> {
    if !is_listed(&troop.name) {
        return None;
    }
    let detail = resolver.troop_detail(troop.id)?;
    let mut b = Builder::new(resolver, RefKind::Troop, troop.id, &troop.name);
    b.attr("Members", detail.members.iter().map(|m| m.count).sum::<u32>());
    b.attr("Battle Event Pages", troop.pages.len());
    for group in &detail.members {
        let label = group.name.clone().unwrap_or_else(|| format!("#{}", group.enemy_id));
        let hidden = if group.hidden > 0 {
            format!(" ({} hidden)", group.hidden)
        } else {
            String::new()
        };
        b.line(Line {
            text: format!("{label} ×{}{hidden}", group.count),
            references: vec![Reference::new(RefKind::Enemy, group.enemy_id)],
        });
    }
    Some(b.finish())
}
