//! Page and event level analysis: triggers, conditions, sprites, classification.

use std::fmt;

use serde::{Serialize, Serializer};
use tsukuru_data::model::{Command, EventPage, EventRecord, PageConditions, PageImage};
use tsukuru_data::{NameLookup, RefKind};

use crate::instruction::Instruction;
use crate::opcode::{self, is_story};

/// What starts an event page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    ActionButton,
    PlayerTouch,
    EventTouch,
    Autorun,
    Parallel,
    Unknown(i32),
}

impl Trigger {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::ActionButton,
            1 => Self::PlayerTouch,
            2 => Self::EventTouch,
            3 => Self::Autorun,
            4 => Self::Parallel,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActionButton => f.write_str("Action Button"),
            Self::PlayerTouch => f.write_str("Player Touch"),
            Self::EventTouch => f.write_str("Event Touch"),
            Self::Autorun => f.write_str("Autorun"),
            Self::Parallel => f.write_str("Parallel"),
            Self::Unknown(code) => write!(f, "Unknown ({code})"),
        }
    }
}

impl Serialize for Trigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One appearance condition of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Condition {
    Switch { id: i32, name: Option<String> },
    Variable { id: i32, name: Option<String>, at_least: i32 },
    SelfSwitch { channel: String },
    Item { id: i32, name: Option<String> },
    Actor { id: i32, name: Option<String> },
}

fn label(name: &Option<String>, id: i32) -> String {
    name.clone().unwrap_or_else(|| format!("#{id}"))
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch { id, name } => write!(f, "switch [{}] is ON", label(name, *id)),
            Self::Variable { id, name, at_least } => {
                write!(f, "variable [{}] >= {at_least}", label(name, *id))
            }
            Self::SelfSwitch { channel } => write!(f, "self switch {channel} is ON"),
            Self::Item { id, name } => write!(f, "party has [{}]", label(name, *id)),
            Self::Actor { id, name } => write!(f, "actor [{}] is in the party", label(name, *id)),
        }
    }
}

/// Appearance conditions in editor order.
pub fn conditions(raw: &PageConditions, names: &dyn NameLookup) -> Vec<Condition> {
    let name = |kind, id| names.name_of(kind, id).map(str::to_owned);
    let mut out = Vec::new();
    if raw.switch1_valid {
        out.push(Condition::Switch {
            id: raw.switch1_id,
            name: name(RefKind::Switch, raw.switch1_id),
        });
    }
    if raw.switch2_valid {
        out.push(Condition::Switch {
            id: raw.switch2_id,
            name: name(RefKind::Switch, raw.switch2_id),
        });
    }
    if raw.variable_valid {
        out.push(Condition::Variable {
            id: raw.variable_id,
            name: name(RefKind::Variable, raw.variable_id),
            at_least: raw.variable_value,
        });
    }
    if raw.self_switch_valid {
        let channel = if raw.self_switch_ch.is_empty() {
            "A".to_owned()
        } else {
            raw.self_switch_ch.clone()
        };
        out.push(Condition::SelfSwitch { channel });
    }
    if raw.item_valid {
        out.push(Condition::Item {
            id: raw.item_id,
            name: name(RefKind::Item, raw.item_id),
        });
    }
    if raw.actor_valid {
        out.push(Condition::Actor {
            id: raw.actor_id,
            name: name(RefKind::Actor, raw.actor_id),
        });
    }
    out
}

/// What a page looks like on the map, plus the face of its first message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Visual {
    pub character_name: String,
    pub character_index: i32,
    pub is_big_character: bool,
    pub tile_id: i32,
    pub direction: i32,
    pub pattern: i32,
    pub face_name: String,
    pub face_index: i32,
}

/// Face graphic of the first message that has one.
fn first_face(commands: &[Command]) -> Option<(String, i32)> {
    commands
        .iter()
        .filter(|c| c.code == opcode::SHOW_TEXT)
        .find_map(|c| {
            let face = c.text(0)?.trim();
            (!face.is_empty()).then(|| (face.to_owned(), c.id(1)))
        })
}

/// `None` for pages with no sprite, tile or face to show.
pub fn visual(image: &PageImage, commands: &[Command]) -> Option<Visual> {
    let character_name = image.character_name.trim();
    let (face_name, face_index) = first_face(commands).unwrap_or_default();
    if character_name.is_empty() && image.tile_id == 0 && face_name.is_empty() {
        return None;
    }
    Some(Visual {
        character_name: character_name.to_owned(),
        character_index: image.character_index,
        is_big_character: image.is_big_character(),
        tile_id: image.tile_id,
        direction: if image.direction == 0 { 2 } else { image.direction },
        pattern: image.pattern,
        face_name,
        face_index,
    })
}

/// Coarse purpose of an event, from the commands across all of its pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Treasure,
    Transfer,
    Battle,
    Dialog,
    Other,
}

impl EventKind {
    fn of(command: &Command) -> Option<Self> {
        match command.code {
            // Only gains count as treasure.
            opcode::CHANGE_ITEMS | opcode::CHANGE_WEAPONS | opcode::CHANGE_ARMORS
                if command.int(1) == Some(0) =>
            {
                Some(Self::Treasure)
            }
            opcode::CHANGE_GOLD if command.int(0) == Some(0) => Some(Self::Treasure),
            opcode::TRANSFER_PLAYER => Some(Self::Transfer),
            opcode::BATTLE => Some(Self::Battle),
            opcode::SHOW_TEXT => Some(Self::Dialog),
            _ => None,
        }
    }

    /// Highest-priority kind found on any page; declaration order is priority order.
    pub fn classify(event: &EventRecord) -> Self {
        event
            .pages
            .iter()
            .flat_map(|page| &page.commands)
            .filter_map(Self::of)
            .min()
            .unwrap_or(Self::Other)
    }
}

/// Pages with dialogue, choices or scripts.
pub fn is_story_page(page: &EventPage) -> bool {
    page.commands.iter().any(|c| is_story(c.code))
}

/// One interpreted event page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAnalysis {
    /// 1-based, as shown in the editor.
    pub index: usize,
    pub trigger: Trigger,
    pub conditions: Vec<Condition>,
    pub visual: Option<Visual>,
    pub story: bool,
    pub instructions: Vec<Instruction>,
}

/// One interpreted map event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAnalysis {
    pub id: i32,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub kind: EventKind,
    pub pages: Vec<PageAnalysis>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NoNames;

    impl NameLookup for NoNames {
        fn name_of(&self, kind: RefKind, id: i32) -> Option<&str> {
            (kind == RefKind::Switch && id == 3).then_some("Door open")
        }

        fn goods_names(&self) -> Vec<(tsukuru_data::Reference, &str)> {
            Vec::new()
        }
    }

    fn page(codes: &[(i32, serde_json::Value)]) -> EventPage {
        EventPage {
            commands: codes
                .iter()
                .map(|(code, params)| Command::new(*code, 0, params.as_array().cloned().unwrap_or_default()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_classification_priority() {
        let event = EventRecord {
            pages: vec![
                page(&[(101, json!(["", 0, 0, 2])), (301, json!([0, 1]))]),
                page(&[(126, json!([1, 0, 0, 1]))]),
            ],
            ..Default::default()
        };
        assert_eq!(EventKind::classify(&event), EventKind::Treasure);

        // Taking gold away is not treasure.
        let event = EventRecord {
            pages: vec![page(&[(125, json!([1, 0, 10])), (201, json!([0, 2, 0, 0]))])],
            ..Default::default()
        };
        assert_eq!(EventKind::classify(&event), EventKind::Transfer);
        assert_eq!(EventKind::classify(&EventRecord::default()), EventKind::Other);
    }

    #[test]
    fn test_conditions_display() {
        let raw = PageConditions {
            switch1_valid: true,
            switch1_id: 3,
            variable_valid: true,
            variable_id: 8,
            variable_value: 2,
            self_switch_valid: true,
            self_switch_ch: "B".into(),
            ..Default::default()
        };
        let text: Vec<String> = conditions(&raw, &NoNames).iter().map(ToString::to_string).collect();
        assert_eq!(
            text,
            vec!["switch [Door open] is ON", "variable [#8] >= 2", "self switch B is ON"]
        );
    }

    #[test]
    fn test_visual_takes_first_face() {
        let commands = page(&[(101, json!(["", 0])), (101, json!(["People1", 3]))]).commands;
        let visual = visual(&PageImage::default(), &commands).unwrap();
        assert_eq!(visual.face_name, "People1");
        assert_eq!(visual.face_index, 3);
        assert_eq!(visual.direction, 2);
        assert!(super::visual(&PageImage::default(), &[]).is_none());
    }

    #[test]
    fn test_trigger_labels() {
        assert_eq!(Trigger::from_code(3).to_string(), "Autorun");
        assert_eq!(Trigger::from_code(9).to_string(), "Unknown (9)");
        assert_eq!(serde_json::to_value(Trigger::from_code(0)).unwrap(), json!("Action Button"));
    }

    #[test]
    fn test_story_page() {
        assert!(is_story_page(&page(&[(356, json!(["Quest start"]))])));
        assert!(!is_story_page(&page(&[(201, json!([0, 1, 0, 0]))])));
    }
}
