use std::collections::BTreeMap;

use tsukuru_common::{Loaded, Warnings};
use tsukuru_data::{Project, RefKind};
use tsukuru_event::opcode::is_story;
use tsukuru_event::Interpreter;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::entry::{
    armor_entry, enemy_entry, item_entry, skill_entry, troop_entry, weapon_entry, CatalogEntry, CATALOG_KINDS,
};
use crate::resolve::{EncounterDetail, Resolver, TroopDetail};
use crate::special::{SpecialEncounter, SpecialScan, SpecialTroop};

/// Everything browsable about one loaded project. Immutable once built;
/// a reload builds a new one.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: BTreeMap<RefKind, Vec<CatalogEntry>>,
    troops: BTreeMap<i32, TroopDetail>,
    encounters: BTreeMap<i32, EncounterDetail>,
    special_troops: Vec<SpecialTroop>,
    special_encounters: Vec<SpecialEncounter>,
}

fn build_category(kind: RefKind, resolver: Resolver<'_>) -> Vec<CatalogEntry> {
    let db = resolver.database();
    match kind {
        RefKind::Item => db.items.iter().filter_map(|r| item_entry(r, resolver)).collect(),
        RefKind::Weapon => db.weapons.iter().filter_map(|r| weapon_entry(r, resolver)).collect(),
        RefKind::Armor => db.armors.iter().filter_map(|r| armor_entry(r, resolver)).collect(),
        RefKind::Skill => db.skills.iter().filter_map(|r| skill_entry(r, resolver)).collect(),
        RefKind::Enemy => db.enemies.iter().filter_map(|r| enemy_entry(r, resolver)).collect(),
        RefKind::Troop => db.troops.iter().filter_map(|r| troop_entry(r, resolver)).collect(),
        _ => Vec::new(),
    }
}

/// Interpret every map event page and common event, collecting battle sites.
fn scan_events(project: &Project, warnings: &mut Warnings) -> SpecialScan {
    let interpreter = Interpreter::new(&project.database);
    let mut scan = SpecialScan::new(project);
    for (&map_id, map) in &project.maps {
        let interpreter = interpreter.for_map(map_id);
        let context = format!("Map{map_id:03}");
        for event in &map.events {
            let analysis = interpreter.interpret_event(event, &context).drain_into(warnings);
            for page in &analysis.pages {
                let site = format!("{context}/EV{:03}/{}", event.id, page.index);
                scan.record(&site, page.story, &page.instructions);
            }
        }
    }
    for common in &project.database.common_events {
        let story = common.commands.iter().any(|c| is_story(c.code));
        let instructions = interpreter.interpret_common_event(common).drain_into(warnings);
        scan.record(&format!("CommonEvent{:03}", common.id), story, &instructions);
    }
    scan
}

impl Catalog {
    /// Build the catalog. Never fails; malformed command lists surface as warnings.
    pub fn build(project: &Project) -> Loaded<Self> {
        let resolver = Resolver::new(project);

        #[cfg(feature = "parallel")]
        let categories: BTreeMap<RefKind, Vec<CatalogEntry>> = CATALOG_KINDS
            .par_iter()
            .map(|&kind| (kind, build_category(kind, resolver)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let categories: BTreeMap<RefKind, Vec<CatalogEntry>> = CATALOG_KINDS
            .iter()
            .map(|&kind| (kind, build_category(kind, resolver)))
            .collect();

        let troops = project
            .database
            .troops
            .ids()
            .filter_map(|id| resolver.troop_detail(id).map(|detail| (id, detail)))
            .collect();
        let encounters = project
            .maps
            .keys()
            .filter_map(|&id| resolver.encounter_detail(id).map(|detail| (id, detail)))
            .filter(|(_, detail)| !detail.rows.is_empty())
            .collect();

        let mut warnings = Warnings::new();
        let (special_troops, special_encounters) = scan_events(project, &mut warnings).finish(&project.database);

        tracing::debug!(
            entries = categories.values().map(Vec::len).sum::<usize>(),
            special_troops = special_troops.len(),
            warnings = warnings.len(),
            "catalog_built"
        );
        Loaded::new(
            Self {
                categories,
                troops,
                encounters,
                special_troops,
                special_encounters,
            },
            warnings,
        )
    }

    /// Entries of one kind whose name contains `filter`, ignoring case. An empty filter lists all.
    pub fn category(&self, kind: RefKind, filter: &str) -> Vec<&CatalogEntry> {
        let needle = filter.trim().to_lowercase();
        self.categories
            .get(&kind)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| needle.is_empty() || e.name.to_lowercase().contains(&needle))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn entry(&self, kind: RefKind, id: i32) -> Option<&CatalogEntry> {
        self.categories.get(&kind)?.iter().find(|e| e.id == id)
    }

    pub fn troop_detail(&self, id: i32) -> Option<&TroopDetail> {
        self.troops.get(&id)
    }

    /// Encounter table of a map; `None` when the map has no table or was not decoded.
    pub fn encounter_detail(&self, map_id: i32) -> Option<&EncounterDetail> {
        self.encounters.get(&map_id)
    }

    pub fn special_troops(&self) -> &[SpecialTroop] {
        &self.special_troops
    }

    pub fn special_encounters(&self) -> &[SpecialEncounter] {
        &self.special_encounters
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
