use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;
use tsukuru_common::{Loaded, Warnings};
use tsukuru_data::model::{Command, CommonEvent, EventPage, EventRecord};
use tsukuru_data::{NameLookup, RefKind, Reference};

use crate::balance::check_balance;
use crate::coalesce::coalesce;
use crate::instruction::{Instruction, Mention};
use crate::page::{conditions, is_story_page, visual, EventAnalysis, EventKind, PageAnalysis, Trigger};
use crate::render::Renderer;
use crate::style::Style;

type FxHashSet<T> = hashbrown::HashSet<T, BuildHasherDefault<FxHasher>>;

/// Goods names shorter than this are too ambiguous to match in dialogue.
const MIN_NAME_CHARS: usize = 2;

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whether `name` occurs in `text` with no ASCII word character on either side.
fn contains_word(text: &str, name: &str) -> bool {
    text.match_indices(name).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + name.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

/// Turns raw command lists into rendered [`Instruction`]s.
///
/// Build one per database; [`Interpreter::for_map`] gives a copy that also
/// knows which map's encounter table a random battle refers to.
#[derive(Clone)]
pub struct Interpreter<'a> {
    names: &'a dyn NameLookup,
    goods: Vec<(Reference, &'a str)>,
    map_id: Option<i32>,
}

impl<'a> Interpreter<'a> {
    pub fn new(names: &'a dyn NameLookup) -> Self {
        let mut goods = names.goods_names();
        goods.retain(|(_, name)| name.chars().count() >= MIN_NAME_CHARS);
        // Longer names first so "Hi-Potion" is reported before "Potion".
        goods.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));
        Self {
            names,
            goods,
            map_id: None,
        }
    }

    pub fn for_map(&self, map_id: i32) -> Self {
        Self {
            map_id: Some(map_id),
            ..self.clone()
        }
    }

    fn goods_in(&self, text: &str, seen: &mut FxHashSet<Reference>, out: &mut Vec<Mention>) {
        let mut text = text.to_owned();
        for &(reference, name) in &self.goods {
            if !contains_word(&text, name) {
                continue;
            }
            // Blank the match so "Potion" is not found again inside "Hi-Potion".
            text = text.replace(name, &" ".repeat(name.len()));
            if seen.insert(reference) {
                out.push(Mention::new(reference, Some(name)));
            }
        }
    }

    /// Render a command list. Block nesting problems are reported under `context`.
    pub fn interpret(&self, commands: &[Command], context: &str) -> Loaded<Vec<Instruction>> {
        let mut warnings = Warnings::new();
        check_balance(commands, context, &mut warnings);

        let renderer = Renderer::new(self.names, self.map_id);
        let mut instructions = Vec::new();
        for group in coalesce(commands) {
            let Some(mut rendered) = renderer.render(group) else {
                continue;
            };
            if matches!(rendered.style, Style::Dialogue | Style::ScrollText | Style::Choice) {
                let mut seen: FxHashSet<Reference> = rendered.mentions.iter().map(|m| m.reference).collect();
                let mut found = Vec::new();
                for text in std::iter::once(&rendered.text).chain(&rendered.lines) {
                    self.goods_in(text, &mut seen, &mut found);
                }
                rendered.mentions.extend(found);
            }
            instructions.push(Instruction {
                code: group.head().code,
                indent: group.head().indent,
                text: rendered.text,
                lines: rendered.lines,
                style: rendered.style,
                mentions: rendered.mentions,
                span: group.span(),
            });
        }

        tracing::trace!(context, commands = commands.len(), instructions = instructions.len(), "commands_interpreted");
        Loaded::new(instructions, warnings)
    }

    /// Render one page. `index` is 0-based; the result carries the 1-based editor number.
    pub fn interpret_page(&self, page: &EventPage, index: usize, context: &str) -> Loaded<PageAnalysis> {
        let story = is_story_page(page);
        let Loaded {
            value: mut instructions,
            warnings,
        } = self.interpret(&page.commands, context);
        if story {
            for mention in instructions
                .iter_mut()
                .filter(|i| i.style == Style::Battle)
                .flat_map(|i| i.mentions.iter_mut())
                .filter(|m| matches!(m.reference.kind, RefKind::Troop | RefKind::Encounter))
            {
                mention.special = true;
            }
        }
        Loaded::new(
            PageAnalysis {
                index: index + 1,
                trigger: Trigger::from_code(page.trigger),
                conditions: conditions(&page.conditions, self.names),
                visual: visual(&page.image, &page.commands),
                story,
                instructions,
            },
            warnings,
        )
    }

    /// Render every page of a map event. `context` names the map, e.g. `Map003`.
    pub fn interpret_event(&self, event: &EventRecord, context: &str) -> Loaded<EventAnalysis> {
        let mut warnings = Warnings::new();
        let pages = event
            .pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                let context = format!("{context}/EV{:03}/{}", event.id, index + 1);
                self.interpret_page(page, index, &context).drain_into(&mut warnings)
            })
            .collect();
        Loaded::new(
            EventAnalysis {
                id: event.id,
                name: event.name.clone(),
                x: event.x,
                y: event.y,
                kind: EventKind::classify(event),
                pages,
            },
            warnings,
        )
    }

    pub fn interpret_common_event(&self, event: &CommonEvent) -> Loaded<Vec<Instruction>> {
        self.interpret(&event.commands, &format!("CommonEvent{:03}", event.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as Json};
    use tsukuru_common::WarningKind;
    use tsukuru_data::model::Troop;
    use tsukuru_data::Database;

    fn database() -> Database {
        let mut db = Database::default();
        let mut warnings = Warnings::new();
        for (id, name) in [(1, "Potion"), (2, "Hi-Potion"), (3, "X")] {
            db.items.insert(
                tsukuru_data::model::Item {
                    id,
                    name: name.into(),
                    ..Default::default()
                },
                "Items",
                &mut warnings,
            );
        }
        db.armors.insert(
            tsukuru_data::model::Armor {
                id: 1,
                name: "月の指輪".into(),
                ..Default::default()
            },
            "Armors",
            &mut warnings,
        );
        db.troops.insert(
            Troop {
                id: 4,
                name: "Bandits".into(),
                ..Default::default()
            },
            "Troops",
            &mut warnings,
        );
        db
    }

    fn cmd(code: i32, indent: i32, params: Json) -> Command {
        Command::new(code, indent, params.as_array().cloned().unwrap_or_default())
    }

    #[test]
    fn test_text_then_move_route_is_two_instructions() {
        let db = database();
        let commands = [
            cmd(101, 0, json!(["", 0, 0, 2])),
            cmd(401, 0, json!(["First line"])),
            cmd(401, 0, json!(["Second line"])),
            cmd(205, 0, json!([0, {"list": [{"code": 0}]}])),
        ];
        let Loaded { value, warnings } = Interpreter::new(&db).interpret(&commands, "test");
        assert!(warnings.is_empty());
        assert_eq!(value.len(), 2);
        assert_eq!(value[0].style, Style::Dialogue);
        assert_eq!(value[0].lines, vec!["First line", "Second line"]);
        assert_eq!(value[0].span, 3);
        assert_eq!(value[1].style, Style::Movement);
        assert_eq!(value[1].span, 1);
    }

    #[test]
    fn test_dialogue_names_goods() {
        let db = database();
        let commands = [
            cmd(101, 0, json!(["", 0, 0, 2])),
            cmd(401, 0, json!(["Take this Hi-Potion, not a Potions crate."])),
            cmd(401, 0, json!(["それと月の指輪を。X marks it."])),
        ];
        let value = Interpreter::new(&db).interpret(&commands, "test").value;
        let found: Vec<Reference> = value[0].references().collect();
        assert_eq!(
            found,
            vec![Reference::new(RefKind::Item, 2), Reference::new(RefKind::Armor, 1)]
        );
        assert!(value[0].mentions.iter().all(Mention::is_resolved));
    }

    #[test]
    fn test_unbalanced_page_still_renders() {
        let db = database();
        let commands = [
            cmd(111, 0, json!([8, 1])),
            cmd(126, 1, json!([1, 0, 0, 1])),
            cmd(0, 1, json!([])),
            cmd(0, 0, json!([])),
        ];
        let Loaded { value, warnings } = Interpreter::new(&db).interpret(&commands, "Map001/EV002/1");
        assert_eq!(value.len(), 2);
        assert_eq!(value[1].indent, 1);
        assert_eq!(warnings.count(WarningKind::Structure), 1);
    }

    #[test]
    fn test_story_battle_marked_special() {
        let db = database();
        let page = EventPage {
            commands: vec![
                cmd(101, 0, json!(["", 0, 0, 2])),
                cmd(401, 0, json!(["Hand over the gold!"])),
                cmd(301, 0, json!([0, 4, false, false])),
                cmd(301, 0, json!([2, 0, false, false])),
                cmd(0, 0, json!([])),
            ],
            ..Default::default()
        };
        let interpreter = Interpreter::new(&db).for_map(7);
        let analysis = interpreter.interpret_page(&page, 0, "Map007/EV001/1").value;
        assert!(analysis.story);
        assert_eq!(analysis.index, 1);
        let battles: Vec<&Mention> = analysis
            .instructions
            .iter()
            .filter(|i| i.style == Style::Battle)
            .flat_map(|i| &i.mentions)
            .collect();
        assert_eq!(battles.len(), 2);
        assert!(battles.iter().all(|m| m.special));
        assert_eq!(battles[0].name.as_deref(), Some("Bandits"));
        assert_eq!(battles[1].reference, Reference::new(RefKind::Encounter, 7));
    }

    #[test]
    fn test_event_pages_and_kind() {
        let db = database();
        let event = EventRecord {
            id: 2,
            name: "Chest".into(),
            pages: vec![
                EventPage {
                    commands: vec![cmd(126, 0, json!([1, 0, 0, 1])), cmd(0, 0, json!([]))],
                    ..Default::default()
                },
                EventPage {
                    trigger: 3,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let analysis = Interpreter::new(&db).interpret_event(&event, "Map001").value;
        assert_eq!(analysis.kind, EventKind::Treasure);
        assert_eq!(analysis.pages.len(), 2);
        assert_eq!(analysis.pages[1].trigger, Trigger::Autorun);
        assert!(analysis.pages[1].instructions.is_empty());
        assert_eq!(analysis.pages[0].instructions[0].text, "Change items: Potion +1");
    }

    #[test]
    fn test_word_boundaries() {
        assert!(contains_word("a Potion.", "Potion"));
        assert!(!contains_word("Potions", "Potion"));
        assert!(!contains_word("my_Potion", "Potion"));
        assert!(contains_word("薬Potion薬", "Potion"));
    }
}
