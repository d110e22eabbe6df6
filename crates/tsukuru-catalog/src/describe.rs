//! Traits and use effects in words.

use tsukuru_data::model::{Effect, Trait};
use tsukuru_data::{Database, NameLookup, RefKind, Reference};

use crate::labels::{self, term};

/// A derived text line and the database records it names.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub references: Vec<Reference>,
}

impl Line {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            references: Vec::new(),
        }
    }

    fn naming(text: impl Into<String>, kind: RefKind, id: i32) -> Self {
        Self {
            text: text.into(),
            references: if id > 0 { vec![Reference::new(kind, id)] } else { Vec::new() },
        }
    }
}

fn percent(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

pub(crate) fn name(db: &Database, kind: RefKind, id: i32) -> String {
    db.name_of(kind, id).map_or_else(|| format!("#{id}"), str::to_owned)
}

/// Element label; -1 is the attacker's normal attack element.
pub(crate) fn element(db: &Database, id: i32) -> String {
    match id {
        -1 => "Normal Attack".to_owned(),
        0 => "None".to_owned(),
        id => name(db, RefKind::Element, id),
    }
}

pub fn describe_trait(t: &Trait, db: &Database) -> Line {
    let system = &db.system;
    let (id, value) = (t.data_id, t.value);
    match t.code {
        11 => Line::plain(format!("{} Rate {}%", element(db, id), percent(value))),
        12 => Line::plain(format!("{} Debuff Rate {}%", labels::param(id), percent(value))),
        13 => Line::naming(
            format!("{} Rate {}%", name(db, RefKind::State, id), percent(value)),
            RefKind::State,
            id,
        ),
        14 => Line::naming(
            format!("Resist {}", name(db, RefKind::State, id)),
            RefKind::State,
            id,
        ),
        21 => Line::plain(format!("{} × {}%", labels::param(id), percent(value))),
        22 => Line::plain(format!("{} {:+}%", labels::xparam(id), percent(value))),
        23 => Line::plain(format!("{} × {}%", labels::sparam(id), percent(value))),
        31 => Line::plain(format!("Attack Element: {}", element(db, id))),
        32 => Line::naming(
            format!("Attack State: {} {}%", name(db, RefKind::State, id), percent(value)),
            RefKind::State,
            id,
        ),
        33 => Line::plain(format!("Attack Speed {:+}", value as i64)),
        34 => Line::plain(format!("Attack Times +{}", value as i64)),
        41 => Line::plain(format!("Add Skill Type: {}", term(&system.skill_types, id))),
        42 => Line::plain(format!("Seal Skill Type: {}", term(&system.skill_types, id))),
        43 => Line::naming(
            format!("Add Skill: {}", name(db, RefKind::Skill, id)),
            RefKind::Skill,
            id,
        ),
        44 => Line::naming(
            format!("Seal Skill: {}", name(db, RefKind::Skill, id)),
            RefKind::Skill,
            id,
        ),
        51 => Line::plain(format!("Equip Weapon: {}", term(&system.weapon_types, id))),
        52 => Line::plain(format!("Equip Armor: {}", term(&system.armor_types, id))),
        53 => Line::plain(format!("Lock Equip: {}", term(&system.equip_types, id))),
        54 => Line::plain(format!("Seal Equip: {}", term(&system.equip_types, id))),
        55 => Line::plain(if id == 1 {
            "Dual Wield".to_owned()
        } else {
            format!("Slot Type {id}")
        }),
        61 => Line::plain(format!("Action Times +{}%", percent(value))),
        62 => Line::plain(match id {
            0 => "Auto Battle".to_owned(),
            1 => "Guard".to_owned(),
            2 => "Substitute".to_owned(),
            3 => "Preserve TP".to_owned(),
            other => format!("Special Flag {other}"),
        }),
        63 => Line::plain(match id {
            0 => "Collapse Effect: Normal".to_owned(),
            1 => "Collapse Effect: Boss".to_owned(),
            2 => "Collapse Effect: Instant".to_owned(),
            3 => "Collapse Effect: No Disappear".to_owned(),
            other => format!("Collapse Effect: #{other}"),
        }),
        64 => Line::plain(match id {
            0 => "Encounter Half".to_owned(),
            1 => "Encounter None".to_owned(),
            2 => "Cancel Surprise".to_owned(),
            3 => "Raise Preemptive".to_owned(),
            4 => "Gold Double".to_owned(),
            5 => "Drop Item Double".to_owned(),
            other => format!("Party Ability {other}"),
        }),
        code => Line::plain(format!("Trait [{code}, {id}, {value}]")),
    }
}

pub fn describe_effect(e: &Effect, db: &Database) -> Line {
    let id = e.data_id;
    let recover = |stat: &str| {
        let mut parts = Vec::new();
        if e.value1 != 0.0 {
            parts.push(format!("{}%", percent(e.value1)));
        }
        if e.value2 != 0.0 {
            parts.push(format!("{}", e.value2 as i64));
        }
        if parts.is_empty() {
            format!("Recover {stat}")
        } else {
            format!("Recover {stat} {}", parts.join(" + "))
        }
    };
    match e.code {
        11 => Line::plain(recover("HP")),
        12 => Line::plain(recover("MP")),
        13 => Line::plain(format!("Gain TP {}", e.value1 as i64)),
        21 => Line::naming(
            format!("Add State: {} {}%", name(db, RefKind::State, id), percent(e.value1)),
            RefKind::State,
            id,
        ),
        22 => Line::naming(
            format!("Remove State: {} {}%", name(db, RefKind::State, id), percent(e.value1)),
            RefKind::State,
            id,
        ),
        31 => Line::plain(format!("Add Buff: {} {} turns", labels::param(id), e.value1 as i64)),
        32 => Line::plain(format!("Add Debuff: {} {} turns", labels::param(id), e.value1 as i64)),
        33 => Line::plain(format!("Remove Buff: {}", labels::param(id))),
        34 => Line::plain(format!("Remove Debuff: {}", labels::param(id))),
        41 => Line::plain(if id == 0 {
            "Special Effect: Escape".to_owned()
        } else {
            format!("Special Effect {id}")
        }),
        42 => Line::plain(format!("Grow: {} +{}", labels::param(id), e.value1 as i64)),
        43 => Line::naming(
            format!("Learn Skill: {}", name(db, RefKind::Skill, id)),
            RefKind::Skill,
            id,
        ),
        44 => Line::naming(
            format!("Common Event: {}", name(db, RefKind::CommonEvent, id)),
            RefKind::CommonEvent,
            id,
        ),
        code => Line::plain(format!("Effect [{code}, {id}]")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsukuru_common::Warnings;
    use tsukuru_data::model::State;

    fn database() -> Database {
        let mut db = Database::default();
        db.states.insert(
            State {
                id: 4,
                name: "Poison".into(),
                ..Default::default()
            },
            "States",
            &mut Warnings::new(),
        );
        db.system.elements = vec!["".into(), "Physical".into(), "Fire".into()];
        db.system.weapon_types = vec!["".into(), "Dagger".into()];
        db
    }

    fn tr(code: i32, data_id: i32, value: f64) -> Trait {
        Trait { code, data_id, value }
    }

    #[test]
    fn test_traits() {
        let db = database();
        assert_eq!(describe_trait(&tr(11, 2, 0.5), &db).text, "Fire Rate 50%");
        assert_eq!(describe_trait(&tr(22, 0, 0.95), &db).text, "Hit Rate +95%");
        assert_eq!(describe_trait(&tr(22, 1, -0.1), &db).text, "Evasion Rate -10%");
        assert_eq!(describe_trait(&tr(51, 1, 0.0), &db).text, "Equip Weapon: Dagger");
        let resist = describe_trait(&tr(14, 4, 1.0), &db);
        assert_eq!(resist.text, "Resist Poison");
        assert_eq!(resist.references, vec![Reference::new(RefKind::State, 4)]);
        assert_eq!(describe_trait(&tr(99, 1, 2.0), &db).text, "Trait [99, 1, 2]");
    }

    #[test]
    fn test_effects() {
        let db = database();
        let heal = Effect {
            code: 11,
            data_id: 0,
            value1: 0.1,
            value2: 50.0,
        };
        assert_eq!(describe_effect(&heal, &db).text, "Recover HP 10% + 50");
        let learn = Effect {
            code: 43,
            data_id: 7,
            ..Default::default()
        };
        let line = describe_effect(&learn, &db);
        assert_eq!(line.text, "Learn Skill: #7");
        assert_eq!(line.references, vec![Reference::new(RefKind::Skill, 7)]);
    }
}
