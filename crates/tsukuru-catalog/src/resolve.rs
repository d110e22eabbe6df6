//! Reference resolution with troop and encounter expansion.

use std::collections::BTreeMap;

use serde::Serialize;
use tsukuru_data::model::MapRecord;
use tsukuru_data::{Database, NameLookup, Project, RefKind, Reference};

/// Outcome of looking a reference up. A missing target is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Resolution {
    Resolved { name: String },
    Unresolved,
}

impl Resolution {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Resolved { name } => Some(name),
            Self::Unresolved => None,
        }
    }
}

/// Enemies of a troop, grouped by enemy id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberGroup {
    pub enemy_id: i32,
    pub name: Option<String>,
    pub count: u32,
    /// Members that only appear during battle.
    pub hidden: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TroopDetail {
    pub id: i32,
    pub name: Option<String>,
    pub members: Vec<MemberGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterRow {
    pub weight: i32,
    /// Empty means the whole map.
    pub region_set: Vec<i32>,
    pub troop: TroopDetail,
}

/// A map's random encounter table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterDetail {
    pub map_id: i32,
    pub map_name: Option<String>,
    pub encounter_step: i32,
    pub rows: Vec<EncounterRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GroupDetail {
    Troop(TroopDetail),
    Encounter(EncounterDetail),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedReference {
    #[serde(flatten)]
    pub reference: Reference,
    pub resolution: Resolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<GroupDetail>,
}

impl ResolvedReference {
    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved { .. })
    }

    /// Name, or `#id` for an unresolved target.
    pub fn label(&self) -> String {
        self.resolution
            .name()
            .map_or_else(|| format!("#{}", self.reference.id), str::to_owned)
    }
}

/// Resolves references against one loaded project.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    database: &'a Database,
    maps: &'a BTreeMap<i32, MapRecord>,
}

impl<'a> Resolver<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self {
            database: &project.database,
            maps: &project.maps,
        }
    }

    pub fn database(&self) -> &'a Database {
        self.database
    }

    fn name(&self, kind: RefKind, id: i32) -> Option<String> {
        self.database.name_of(kind, id).map(str::to_owned)
    }

    pub fn troop_detail(&self, id: i32) -> Option<TroopDetail> {
        let troop = self.database.troops.get(id)?;
        let mut groups: BTreeMap<i32, (u32, u32)> = BTreeMap::new();
        for member in troop.members.iter().filter(|m| m.enemy_id > 0) {
            let (count, hidden) = groups.entry(member.enemy_id).or_default();
            *count += 1;
            if member.hidden {
                *hidden += 1;
            }
        }
        Some(TroopDetail {
            id,
            name: self.name(RefKind::Troop, id),
            members: groups
                .into_iter()
                .map(|(enemy_id, (count, hidden))| MemberGroup {
                    enemy_id,
                    name: self.name(RefKind::Enemy, enemy_id),
                    count,
                    hidden,
                })
                .collect(),
        })
    }

    /// Encounter table of a decoded map. Rows naming a missing troop keep an empty member list.
    pub fn encounter_detail(&self, map_id: i32) -> Option<EncounterDetail> {
        let map = self.maps.get(&map_id)?;
        let rows = map
            .encounter_list
            .iter()
            .filter(|row| row.troop_id > 0)
            .map(|row| EncounterRow {
                weight: row.weight,
                region_set: row.region_set.clone(),
                troop: self.troop_detail(row.troop_id).unwrap_or_else(|| TroopDetail {
                    id: row.troop_id,
                    name: None,
                    members: Vec::new(),
                }),
            })
            .collect();
        Some(EncounterDetail {
            map_id,
            map_name: self.name(RefKind::Map, map_id),
            encounter_step: map.encounter_step,
            rows,
        })
    }

    /// Resolve any reference. Never fails; unknown targets come back [`Resolution::Unresolved`].
    pub fn resolve(&self, reference: &Reference) -> ResolvedReference {
        let Reference { kind, id } = *reference;
        let detail = match kind {
            RefKind::Troop => self.troop_detail(id).map(GroupDetail::Troop),
            RefKind::Encounter => self.encounter_detail(id).map(GroupDetail::Encounter),
            _ => None,
        };
        let name = match kind {
            // An encounter exists when its map decoded; the name is the map's.
            RefKind::Encounter if !self.maps.contains_key(&id) => None,
            _ => self.name(kind, id),
        };
        ResolvedReference {
            reference: *reference,
            resolution: name.map_or(Resolution::Unresolved, |name| Resolution::Resolved { name }),
            detail,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tsukuru_common::Warnings;
    use tsukuru_data::model::{Encounter, Enemy, Troop, TroopMember};
    use tsukuru_data::Engine;

    pub(crate) fn project() -> Project {
        let mut warnings = Warnings::new();
        let mut database = Database::default();
        for (id, name) in [(1, "Slime"), (2, "Bat")] {
            database.enemies.insert(
                Enemy {
                    id,
                    name: name.into(),
                    ..Default::default()
                },
                "Enemies",
                &mut warnings,
            );
        }
        let member = |enemy_id, hidden| TroopMember {
            enemy_id,
            hidden,
            ..Default::default()
        };
        database.troops.insert(
            Troop {
                id: 1,
                name: "Slime*2, Bat".into(),
                members: vec![member(1, false), member(2, false), member(1, true), member(9, false)],
                ..Default::default()
            },
            "Troops",
            &mut warnings,
        );
        database.map_infos.insert(
            tsukuru_data::model::MapInfo {
                id: 3,
                name: "Plains".into(),
                ..Default::default()
            },
            "MapInfos",
            &mut warnings,
        );
        let mut maps = BTreeMap::new();
        maps.insert(
            3,
            MapRecord {
                id: 3,
                name: "Plains".into(),
                encounter_step: 30,
                encounter_list: vec![
                    Encounter {
                        troop_id: 1,
                        weight: 5,
                        region_set: vec![2],
                    },
                    Encounter {
                        troop_id: 6,
                        weight: 1,
                        region_set: Vec::new(),
                    },
                ],
                ..Default::default()
            },
        );
        Project {
            engine: Engine::Mv,
            database,
            maps,
        }
    }

    #[test]
    fn test_troop_members_grouped() {
        let project = project();
        let detail = Resolver::new(&project).troop_detail(1).unwrap();
        let summary: Vec<(i32, Option<&str>, u32, u32)> = detail
            .members
            .iter()
            .map(|m| (m.enemy_id, m.name.as_deref(), m.count, m.hidden))
            .collect();
        assert_eq!(
            summary,
            vec![(1, Some("Slime"), 2, 1), (2, Some("Bat"), 1, 0), (9, None, 1, 0)]
        );
    }

    #[test]
    fn test_encounter_detail() {
        let project = project();
        let resolver = Resolver::new(&project);
        let resolved = resolver.resolve(&Reference::new(RefKind::Encounter, 3));
        assert_eq!(resolved.resolution.name(), Some("Plains"));
        let Some(GroupDetail::Encounter(detail)) = resolved.detail else {
            panic!("expected encounter detail");
        };
        assert_eq!(detail.encounter_step, 30);
        assert_eq!(detail.rows.len(), 2);
        assert_eq!(detail.rows[0].troop.members.len(), 3);
        assert_eq!(detail.rows[1].troop.name, None);
    }

    #[test]
    fn test_missing_targets_are_unresolved() {
        let project = project();
        let resolver = Resolver::new(&project);
        let skill = resolver.resolve(&Reference::new(RefKind::Skill, 7));
        assert_eq!(skill.resolution, Resolution::Unresolved);
        assert_eq!(skill.label(), "#7");
        assert_eq!(skill.reference.id, 7);

        let troop = resolver.resolve(&Reference::new(RefKind::Troop, 6));
        assert!(!troop.is_resolved());
        assert!(troop.detail.is_none());

        let encounter = resolver.resolve(&Reference::new(RefKind::Encounter, 4));
        assert!(!encounter.is_resolved());
    }
}
