//! Battles that never come from a random encounter table.
//!
//! A best-effort annotation: a troop is special when some event starts a
//! battle with it and no map lists it for random encounters. Pages with
//! dialogue or scripts mark the battle as story-driven.

use std::collections::BTreeMap;
use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;
use serde::Serialize;
use tsukuru_data::{NameLookup, Project, RefKind};
use tsukuru_event::{Instruction, Style};

type FxHashSet<T> = hashbrown::HashSet<T, BuildHasherDefault<FxHasher>>;

/// Why a troop was flagged. Ordered strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialReason {
    /// Started from a page with dialogue or scripts.
    Story,
    /// Started from a plain event page or common event.
    Event,
}

impl SpecialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Story => "story battle",
            Self::Event => "event battle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialTroop {
    pub troop_id: i32,
    pub name: Option<String>,
    pub reason: SpecialReason,
    /// Where the battle starts, e.g. `Map003/EV012/2` or `CommonEvent005`.
    pub sites: Vec<String>,
}

/// A map whose random encounter table is also entered from a story page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialEncounter {
    pub map_id: i32,
    pub map_name: Option<String>,
    pub sites: Vec<String>,
}

/// Accumulates battle sites during event traversal.
pub(crate) struct SpecialScan {
    listed: FxHashSet<i32>,
    troops: BTreeMap<i32, (SpecialReason, Vec<String>)>,
    encounters: BTreeMap<i32, Vec<String>>,
}

impl SpecialScan {
    pub(crate) fn new(project: &Project) -> Self {
        let listed = project
            .maps
            .values()
            .flat_map(|map| &map.encounter_list)
            .map(|row| row.troop_id)
            .collect();
        Self {
            listed,
            troops: BTreeMap::new(),
            encounters: BTreeMap::new(),
        }
    }

    pub(crate) fn record(&mut self, site: &str, story: bool, instructions: &[Instruction]) {
        let reason = if story { SpecialReason::Story } else { SpecialReason::Event };
        let battles = instructions
            .iter()
            .filter(|i| i.style == Style::Battle)
            .flat_map(|i| &i.mentions);
        for mention in battles {
            let id = mention.reference.id;
            match mention.reference.kind {
                RefKind::Troop if id > 0 && !self.listed.contains(&id) => {
                    let (best, sites) = self.troops.entry(id).or_insert((reason, Vec::new()));
                    *best = (*best).min(reason);
                    push_site(sites, site);
                }
                RefKind::Encounter if story => {
                    push_site(self.encounters.entry(id).or_default(), site);
                }
                _ => {}
            }
        }
    }

    pub(crate) fn finish(self, names: &dyn NameLookup) -> (Vec<SpecialTroop>, Vec<SpecialEncounter>) {
        let troops = self
            .troops
            .into_iter()
            .map(|(troop_id, (reason, sites))| SpecialTroop {
                troop_id,
                name: names.name_of(RefKind::Troop, troop_id).map(str::to_owned),
                reason,
                sites,
            })
            .collect();
        let encounters = self
            .encounters
            .into_iter()
            .map(|(map_id, sites)| SpecialEncounter {
                map_id,
                map_name: names.name_of(RefKind::Map, map_id).map(str::to_owned),
                sites,
            })
            .collect();
        (troops, encounters)
    }
}

fn push_site(sites: &mut Vec<String>, site: &str) {
    if sites.last().map(String::as_str) != Some(site) {
        sites.push(site.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::tests::project;
    use tsukuru_data::Reference;
    use tsukuru_event::Mention;

    fn battle(kind: RefKind, id: i32) -> Instruction {
        Instruction {
            code: 301,
            indent: 0,
            text: String::new(),
            lines: Vec::new(),
            style: Style::Battle,
            mentions: vec![Mention::new(Reference::new(kind, id), None)],
            span: 1,
        }
    }

    #[test]
    fn test_listed_troops_are_not_special() {
        let project = project();
        let mut scan = SpecialScan::new(&project);
        scan.record("Map003/EV001/1", true, &[battle(RefKind::Troop, 1)]);
        scan.record("Map003/EV002/1", false, &[battle(RefKind::Troop, 5)]);
        scan.record("Map003/EV002/2", true, &[battle(RefKind::Troop, 5), battle(RefKind::Troop, 5)]);
        scan.record("CommonEvent004", false, &[battle(RefKind::Troop, 8)]);
        let (troops, encounters) = scan.finish(&project.database);

        assert!(encounters.is_empty());
        let flagged: Vec<(i32, SpecialReason, usize)> =
            troops.iter().map(|t| (t.troop_id, t.reason, t.sites.len())).collect();
        assert_eq!(
            flagged,
            vec![(5, SpecialReason::Story, 2), (8, SpecialReason::Event, 1)]
        );
    }

    #[test]
    fn test_story_encounters_by_map() {
        let project = project();
        let mut scan = SpecialScan::new(&project);
        scan.record("Map003/EV004/1", true, &[battle(RefKind::Encounter, 3)]);
        scan.record("Map003/EV005/1", false, &[battle(RefKind::Encounter, 3)]);
        let (_, encounters) = scan.finish(&project.database);
        assert_eq!(encounters.len(), 1);
        assert_eq!(encounters[0].map_name.as_deref(), Some("Plains"));
        assert_eq!(encounters[0].sites, vec!["Map003/EV004/1"]);
    }
}
