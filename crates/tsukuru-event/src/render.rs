//! Per-opcode English rendering.

use serde_json::Value as Json;
use tsukuru_data::model::Command;
use tsukuru_data::{NameLookup, RefKind, Reference};

use crate::coalesce::Group;
use crate::instruction::Mention;
use crate::opcode::*;
use crate::style::Style;

/// Rendering of one [`Group`], before indent and span are attached.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rendered {
    pub text: String,
    pub lines: Vec<String>,
    pub style: Style,
    pub mentions: Vec<Mention>,
}

impl Rendered {
    fn new(style: Style, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lines: Vec::new(),
            style,
            mentions: Vec::new(),
        }
    }

    fn with(mut self, mention: Option<Mention>) -> Self {
        self.mentions.extend(mention);
        self
    }
}

const DIRECTIONS: [(i64, &str); 4] = [(2, "down"), (4, "left"), (6, "right"), (8, "up")];
const VEHICLES: [&str; 3] = ["boat", "ship", "airship"];
const PARAMS: [&str; 8] = ["Max HP", "Max MP", "Attack", "Defense", "M.Attack", "M.Defense", "Agility", "Luck"];
const BALLOONS: [&str; 11] = [
    "exclamation",
    "question",
    "music note",
    "heart",
    "anger",
    "sweat",
    "cobweb",
    "silence",
    "light bulb",
    "zzz",
    "user-defined 1",
];
const MOVE_STEPS: [&str; 45] = [
    "Move down",
    "Move left",
    "Move right",
    "Move up",
    "Move lower left",
    "Move lower right",
    "Move upper left",
    "Move upper right",
    "Move at random",
    "Move toward player",
    "Move away from player",
    "1 step forward",
    "1 step backward",
    "Jump",
    "Wait",
    "Turn down",
    "Turn left",
    "Turn right",
    "Turn up",
    "Turn 90° right",
    "Turn 90° left",
    "Turn 180°",
    "Turn 90° right or left",
    "Turn at random",
    "Turn toward player",
    "Turn away from player",
    "Switch ON",
    "Switch OFF",
    "Change speed",
    "Change frequency",
    "Walking animation ON",
    "Walking animation OFF",
    "Stepping animation ON",
    "Stepping animation OFF",
    "Direction fix ON",
    "Direction fix OFF",
    "Through ON",
    "Through OFF",
    "Transparent ON",
    "Transparent OFF",
    "Change image",
    "Change opacity",
    "Change blend mode",
    "Play SE",
    "Script",
];

fn num(command: &Command, index: usize) -> i64 {
    command.int(index).unwrap_or(0)
}

/// Parameter as display text: strings verbatim, everything else as JSON.
fn show(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

fn on_off(value: i64) -> &'static str {
    if value == 0 {
        "ON"
    } else {
        "OFF"
    }
}

fn sign(op: i64) -> &'static str {
    if op == 0 {
        "+"
    } else {
        "-"
    }
}

fn allow(value: i64) -> &'static str {
    if value == 0 {
        "disable"
    } else {
        "enable"
    }
}

fn direction(value: i64) -> &'static str {
    DIRECTIONS
        .iter()
        .find(|(code, _)| *code == value)
        .map_or("?", |(_, name)| name)
}

fn vehicle(value: i64) -> &'static str {
    usize::try_from(value)
        .ok()
        .and_then(|i| VEHICLES.get(i))
        .copied()
        .unwrap_or("vehicle")
}

fn subject(id: i64) -> String {
    match id {
        -1 => "player".to_owned(),
        0 => "this event".to_owned(),
        id => format!("event #{id}"),
    }
}

fn enemy_slot(index: i64) -> String {
    if index < 0 {
        "entire troop".to_owned()
    } else {
        format!("enemy #{}", index + 1)
    }
}

/// Name of an audio parameter (`{"name": ...}`).
fn audio_name(value: &Json) -> &str {
    match value.get("name").and_then(Json::as_str) {
        Some("") | None => "(none)",
        Some(name) => name,
    }
}

fn color(value: &Json, len: usize) -> String {
    let parts: Vec<String> = match value.as_array() {
        Some(items) => items.iter().take(len).map(show).collect(),
        None => vec!["0".to_owned(); len],
    };
    format!("({})", parts.join(", "))
}

pub(crate) struct Renderer<'a> {
    names: &'a dyn NameLookup,
    map_id: Option<i32>,
}

impl<'a> Renderer<'a> {
    pub fn new(names: &'a dyn NameLookup, map_id: Option<i32>) -> Self {
        Self { names, map_id }
    }

    /// Display name, or `#id` when the target does not resolve.
    fn name(&self, kind: RefKind, id: i64) -> String {
        i32::try_from(id)
            .ok()
            .and_then(|id| self.names.name_of(kind, id))
            .map_or_else(|| format!("#{id}"), str::to_owned)
    }

    fn mention(&self, kind: RefKind, id: i64) -> Option<Mention> {
        let id = i32::try_from(id).ok().filter(|&id| id > 0)?;
        Some(Mention::new(Reference::new(kind, id), self.names.name_of(kind, id)))
    }

    fn variable(&self, id: i64) -> String {
        format!("variable [{}]", self.name(RefKind::Variable, id))
    }

    fn switch(&self, id: i64) -> String {
        format!("switch [{}]", self.name(RefKind::Switch, id))
    }

    /// `+5`, `-3` or `+variable [x]` for the usual (op, operand type, operand) triple.
    fn operand(&self, command: &Command, op: usize, kind: usize, value: usize) -> String {
        let amount = if num(command, kind) == 0 {
            num(command, value).to_string()
        } else {
            self.variable(num(command, value))
        };
        format!("{}{}", sign(num(command, op)), amount)
    }

    fn actor(&self, id: i64) -> String {
        if id == 0 {
            "entire party".to_owned()
        } else {
            self.name(RefKind::Actor, id)
        }
    }

    /// Actor picked either directly or through a variable.
    fn actor_target(&self, command: &Command) -> String {
        if num(command, 0) == 0 {
            self.actor(num(command, 1))
        } else {
            format!("actor in {}", self.variable(num(command, 1)))
        }
    }

    fn goods(&self, command: &Command) -> (String, Option<Mention>) {
        let kind = RefKind::from_goods_code(num(command, 0));
        let id = num(command, 1);
        let (label, name, mention) = match kind {
            Some(kind) => (kind.as_str(), self.name(kind, id), self.mention(kind, id)),
            None => ("goods", format!("#{id}"), None),
        };
        let price = if num(command, 2) == 1 {
            format!(" (price {})", num(command, 3))
        } else {
            String::new()
        };
        (format!("{label} {name}{price}"), mention)
    }

    pub fn render(&self, group: Group<'_>) -> Option<Rendered> {
        let command = group.head();
        let code = command.code;
        if is_silent(code) {
            return None;
        }
        let continuation_text = || -> Vec<String> {
            group.continuations().iter().map(|c| show(c.param(0))).collect()
        };

        let rendered = match code {
            SHOW_TEXT => {
                let mut text = "Show text".to_owned();
                if let Some(speaker) = command.text(4).filter(|s| !s.is_empty()) {
                    text.push_str(&format!(": {speaker}"));
                }
                let face = command.text(0).unwrap_or_default();
                let position = match command.int(3) {
                    Some(0) => "top",
                    Some(1) => "middle",
                    _ => "bottom",
                };
                if face.is_empty() {
                    text.push_str(&format!(" ({position})"));
                } else {
                    text.push_str(&format!(" (face {face}:{}, {position})", num(command, 1)));
                }
                Rendered {
                    lines: continuation_text(),
                    ..Rendered::new(Style::Dialogue, text)
                }
            }
            TEXT_LINE => Rendered::new(Style::Dialogue, show(command.param(0))),
            SHOW_CHOICES => {
                let choices = match command.param(0) {
                    Json::Array(items) => items.iter().map(show).collect::<Vec<_>>().join(" / "),
                    other => show(other),
                };
                Rendered::new(Style::Choice, format!("Show choices: {choices}"))
            }
            WHEN_CHOICE => Rendered::new(Style::Choice, format!("When \"{}\"", show(command.param(1)))),
            WHEN_CANCEL => Rendered::new(Style::Choice, "When cancel"),
            INPUT_NUMBER => Rendered::new(
                Style::Variable,
                format!(
                    "Input number into {} ({} digits)",
                    self.variable(num(command, 0)),
                    command.int(1).unwrap_or(1)
                ),
            ),
            SELECT_ITEM => {
                let kind = match command.int(1).unwrap_or(1) {
                    1 => "regular item",
                    2 => "key item",
                    3 => "hidden item A",
                    4 => "hidden item B",
                    _ => "item",
                };
                Rendered::new(
                    Style::Item,
                    format!("Select {kind} into {}", self.variable(num(command, 0))),
                )
            }
            SCROLL_TEXT => Rendered {
                lines: continuation_text(),
                ..Rendered::new(
                    Style::ScrollText,
                    format!("Scroll text (speed {})", command.int(0).unwrap_or(2)),
                )
            },
            SCROLL_LINE => Rendered::new(Style::ScrollText, show(command.param(0))),
            COMMENT => Rendered {
                lines: continuation_text(),
                ..Rendered::new(Style::Comment, format!("Comment: {}", show(command.param(0))))
            },
            COMMENT_LINE => Rendered::new(Style::Comment, show(command.param(0))),
            CONDITIONAL => self.conditional(command),
            ELSE => Rendered::new(Style::Conditional, "Else"),
            LOOP => Rendered::new(Style::Loop, "Loop"),
            REPEAT_ABOVE => Rendered::new(Style::Loop, "Repeat above"),
            BREAK_LOOP => Rendered::new(Style::Loop, "Break loop"),
            EXIT_EVENT => Rendered::new(Style::Conditional, "Exit event processing"),
            COMMON_EVENT => {
                let id = num(command, 0);
                Rendered::new(
                    Style::CommonEventCall,
                    format!("Common event: {}", self.name(RefKind::CommonEvent, id)),
                )
                .with(self.mention(RefKind::CommonEvent, id))
            }
            LABEL => Rendered::new(Style::Label, format!("Label: {}", show(command.param(0)))),
            JUMP_TO_LABEL => Rendered::new(Style::Label, format!("Jump to label: {}", show(command.param(0)))),
            CONTROL_SWITCHES => {
                let (first, last) = (num(command, 0), num(command, 1));
                let target = if first == last || command.int(1).is_none() {
                    self.switch(first)
                } else {
                    format!("{}..{}", self.switch(first), self.switch(last))
                };
                Rendered::new(Style::Switch, format!("Control switches: {target} = {}", on_off(num(command, 2))))
            }
            CONTROL_VARIABLES => self.control_variables(command),
            CONTROL_SELF_SWITCH => Rendered::new(
                Style::Switch,
                format!(
                    "Control self switch: {} = {}",
                    command.text(0).unwrap_or("A"),
                    on_off(num(command, 1))
                ),
            ),
            CONTROL_TIMER => {
                let text = if num(command, 0) == 0 {
                    format!("Control timer: start {} seconds", num(command, 1))
                } else {
                    "Control timer: stop".to_owned()
                };
                Rendered::new(Style::System, text)
            }
            CHANGE_GOLD => Rendered::new(Style::Item, format!("Change gold: {}", self.operand(command, 0, 1, 2))),
            CHANGE_ITEMS | CHANGE_WEAPONS | CHANGE_ARMORS => {
                let kind = match code {
                    CHANGE_ITEMS => RefKind::Item,
                    CHANGE_WEAPONS => RefKind::Weapon,
                    _ => RefKind::Armor,
                };
                let id = num(command, 0);
                let label = match kind {
                    RefKind::Item => "items",
                    RefKind::Weapon => "weapons",
                    _ => "armors",
                };
                Rendered::new(
                    Style::Item,
                    format!(
                        "Change {label}: {} {}",
                        self.name(kind, id),
                        self.operand(command, 1, 2, 3)
                    ),
                )
                .with(self.mention(kind, id))
            }
            CHANGE_PARTY => {
                let action = if num(command, 1) == 0 { "add" } else { "remove" };
                let init = if num(command, 2) == 1 { " (initialize)" } else { "" };
                Rendered::new(
                    Style::Actor,
                    format!("Change party member: {action} {}{init}", self.name(RefKind::Actor, num(command, 0))),
                )
            }
            132 => Rendered::new(Style::Audio, format!("Change battle BGM: {}", audio_name(command.param(0)))),
            133 => Rendered::new(Style::Audio, format!("Change victory ME: {}", audio_name(command.param(0)))),
            134 => Rendered::new(Style::System, format!("Change save access: {}", allow(num(command, 0)))),
            135 => Rendered::new(Style::System, format!("Change menu access: {}", allow(num(command, 0)))),
            136 => Rendered::new(Style::System, format!("Change encounter: {}", allow(num(command, 0)))),
            137 => Rendered::new(Style::System, format!("Change formation access: {}", allow(num(command, 0)))),
            138 => Rendered::new(Style::System, format!("Change window color: {}", color(command.param(0), 3))),
            139 => Rendered::new(Style::Audio, format!("Change defeat ME: {}", audio_name(command.param(0)))),
            140 => Rendered::new(
                Style::Audio,
                format!(
                    "Change vehicle BGM: {} {}",
                    vehicle(num(command, 0)),
                    audio_name(command.param(1))
                ),
            ),
            TRANSFER_PLAYER => {
                if num(command, 0) == 0 {
                    let map = num(command, 1);
                    Rendered::new(
                        Style::Transfer,
                        format!(
                            "Transfer player: {} ({}, {})",
                            self.name(RefKind::Map, map),
                            num(command, 2),
                            num(command, 3)
                        ),
                    )
                    .with(self.mention(RefKind::Map, map))
                } else {
                    Rendered::new(Style::Transfer, "Transfer player: location from variables")
                }
            }
            SET_VEHICLE_LOCATION => {
                let target = if num(command, 1) == 0 {
                    format!(
                        "{} ({}, {})",
                        self.name(RefKind::Map, num(command, 2)),
                        num(command, 3),
                        num(command, 4)
                    )
                } else {
                    "location from variables".to_owned()
                };
                Rendered::new(
                    Style::Transfer,
                    format!("Set vehicle location: {} to {target}", vehicle(num(command, 0))),
                )
            }
            SET_EVENT_LOCATION => {
                let who = subject(num(command, 0));
                let text = match num(command, 1) {
                    0 => format!("Set event location: {who} to ({}, {})", num(command, 2), num(command, 3)),
                    1 => format!("Set event location: {who} from variables"),
                    _ => format!("Set event location: {who} exchange with {}", subject(num(command, 2))),
                };
                Rendered::new(Style::Movement, text)
            }
            SCROLL_MAP => Rendered::new(
                Style::Movement,
                format!(
                    "Scroll map: {} {} tiles",
                    direction(command.int(0).unwrap_or(2)),
                    num(command, 1)
                ),
            ),
            SET_MOVE_ROUTE => Rendered {
                lines: group
                    .continuations()
                    .iter()
                    .map(|step| move_step(step.param(0)))
                    .collect(),
                ..Rendered::new(Style::Movement, format!("Set movement route: {}", subject(num(command, 0))))
            },
            MOVE_ROUTE_STEP => Rendered::new(Style::Movement, move_step(command.param(0))),
            GET_ON_OFF_VEHICLE => Rendered::new(Style::Movement, "Get on/off vehicle"),
            211 => Rendered::new(
                Style::Movement,
                format!("Change transparency: {}", on_off(num(command, 0))),
            ),
            212 => Rendered::new(
                Style::Movement,
                format!("Show animation: {} animation #{}", subject(num(command, 0)), num(command, 1)),
            ),
            213 => {
                let id = num(command, 1);
                let balloon = usize::try_from(id - 1)
                    .ok()
                    .and_then(|i| BALLOONS.get(i))
                    .map_or_else(|| format!("#{id}"), |s| (*s).to_owned());
                Rendered::new(
                    Style::Movement,
                    format!("Show balloon icon: {} {balloon}", subject(num(command, 0))),
                )
            }
            214 => Rendered::new(Style::Movement, "Erase event"),
            216 => Rendered::new(
                Style::Movement,
                format!("Change player followers: {}", on_off(num(command, 0))),
            ),
            217 => Rendered::new(Style::Movement, "Gather followers"),
            221 => Rendered::new(Style::Screen, "Fadeout screen"),
            222 => Rendered::new(Style::Screen, "Fadein screen"),
            223 => Rendered::new(
                Style::Screen,
                format!("Tint screen: {} {} frames", color(command.param(0), 4), num(command, 1)),
            ),
            224 => Rendered::new(
                Style::Screen,
                format!("Flash screen: {} {} frames", color(command.param(0), 4), num(command, 1)),
            ),
            225 => Rendered::new(
                Style::Screen,
                format!(
                    "Shake screen: power {} speed {} {} frames",
                    num(command, 0),
                    num(command, 1),
                    num(command, 2)
                ),
            ),
            230 => Rendered::new(Style::Wait, format!("Wait: {} frames", num(command, 0))),
            231 => Rendered::new(
                Style::Picture,
                format!("Show picture #{}: {}", num(command, 0), show(command.param(1))),
            ),
            232 => Rendered::new(Style::Picture, format!("Move picture #{}", num(command, 0))),
            233 => Rendered::new(
                Style::Picture,
                format!("Rotate picture #{}: speed {}", num(command, 0), num(command, 1)),
            ),
            234 => Rendered::new(Style::Picture, format!("Tint picture #{}", num(command, 0))),
            235 => Rendered::new(Style::Picture, format!("Erase picture #{}", num(command, 0))),
            236 => {
                let weather = match command.param(0) {
                    Json::String(s) => s.clone(),
                    other => match other.as_i64() {
                        Some(1) => "rain".to_owned(),
                        Some(2) => "storm".to_owned(),
                        Some(3) => "snow".to_owned(),
                        _ => "none".to_owned(),
                    },
                };
                Rendered::new(
                    Style::Screen,
                    format!("Set weather effect: {weather} power {}", num(command, 1)),
                )
            }
            241 => Rendered::new(Style::Audio, format!("Play BGM: {}", audio_name(command.param(0)))),
            242 => Rendered::new(Style::Audio, format!("Fadeout BGM: {} seconds", num(command, 0))),
            243 => Rendered::new(Style::Audio, "Save BGM"),
            244 => Rendered::new(Style::Audio, "Replay BGM"),
            245 => Rendered::new(Style::Audio, format!("Play BGS: {}", audio_name(command.param(0)))),
            246 => Rendered::new(Style::Audio, format!("Fadeout BGS: {} seconds", num(command, 0))),
            249 => Rendered::new(Style::Audio, format!("Play ME: {}", audio_name(command.param(0)))),
            250 => Rendered::new(Style::Audio, format!("Play SE: {}", audio_name(command.param(0)))),
            251 => Rendered::new(Style::Audio, "Stop SE"),
            261 => Rendered::new(Style::Audio, format!("Play movie: {}", show(command.param(0)))),
            281 => Rendered::new(
                Style::System,
                format!("Change map name display: {}", on_off(num(command, 0))),
            ),
            282 => Rendered::new(Style::System, format!("Change tileset: #{}", num(command, 0))),
            283 => Rendered::new(
                Style::System,
                format!(
                    "Change battle back: {} / {}",
                    show(command.param(0)),
                    show(command.param(1))
                ),
            ),
            284 => Rendered::new(Style::System, format!("Change parallax: {}", show(command.param(0)))),
            285 => Rendered::new(
                Style::Variable,
                format!("Get location info into {}", self.variable(num(command, 0))),
            ),
            BATTLE => self.battle(command),
            IF_WIN => Rendered::new(Style::Battle, "If win"),
            IF_ESCAPE => Rendered::new(Style::Battle, "If escape"),
            IF_LOSE => Rendered::new(Style::Battle, "If lose"),
            SHOP => {
                let mut rendered = Rendered::new(Style::Shop, "Shop processing");
                if num(command, 4) == 1 {
                    rendered.text.push_str(" (purchase only)");
                }
                // The head command carries the first good itself.
                for goods in std::iter::once(command).chain(group.continuations()) {
                    let (line, mention) = self.goods(goods);
                    rendered.lines.push(line);
                    rendered.mentions.extend(mention);
                }
                rendered
            }
            SHOP_GOODS => {
                let (line, mention) = self.goods(command);
                Rendered::new(Style::Shop, line).with(mention)
            }
            NAME_INPUT => Rendered::new(
                Style::Actor,
                format!(
                    "Name input: {} ({} characters)",
                    self.name(RefKind::Actor, num(command, 0)),
                    command.int(1).unwrap_or(8)
                ),
            ),
            311 => Rendered::new(
                Style::Actor,
                format!("Change HP: {} {}", self.actor_target(command), self.operand(command, 2, 3, 4)),
            ),
            312 => Rendered::new(
                Style::Actor,
                format!("Change MP: {} {}", self.actor_target(command), self.operand(command, 2, 3, 4)),
            ),
            CHANGE_STATE => {
                let id = num(command, 3);
                let action = if num(command, 2) == 0 { "add" } else { "remove" };
                Rendered::new(
                    Style::Actor,
                    format!(
                        "Change state: {} {action} {}",
                        self.actor_target(command),
                        self.name(RefKind::State, id)
                    ),
                )
                .with(self.mention(RefKind::State, id))
            }
            314 => Rendered::new(Style::Actor, format!("Recover all: {}", self.actor_target(command))),
            315 => Rendered::new(
                Style::Actor,
                format!("Change EXP: {} {}", self.actor_target(command), self.operand(command, 2, 3, 4)),
            ),
            316 => Rendered::new(
                Style::Actor,
                format!("Change level: {} {}", self.actor_target(command), self.operand(command, 2, 3, 4)),
            ),
            317 => {
                let param = usize::try_from(num(command, 2))
                    .ok()
                    .and_then(|i| PARAMS.get(i))
                    .copied()
                    .unwrap_or("?");
                Rendered::new(
                    Style::Actor,
                    format!(
                        "Change parameter: {} {param} {}",
                        self.actor_target(command),
                        self.operand(command, 3, 4, 5)
                    ),
                )
            }
            CHANGE_SKILL => {
                let id = num(command, 3);
                let action = if num(command, 2) == 0 { "learn" } else { "forget" };
                Rendered::new(
                    Style::Actor,
                    format!(
                        "Change skill: {} {action} {}",
                        self.actor_target(command),
                        self.name(RefKind::Skill, id)
                    ),
                )
                .with(self.mention(RefKind::Skill, id))
            }
            319 => {
                let slot = num(command, 1);
                let item = num(command, 2);
                let kind = if slot == 1 { RefKind::Weapon } else { RefKind::Armor };
                let target = if item == 0 {
                    "none".to_owned()
                } else {
                    self.name(kind, item)
                };
                Rendered::new(
                    Style::Actor,
                    format!(
                        "Change equipment: {} slot {slot} = {target}",
                        self.name(RefKind::Actor, num(command, 0))
                    ),
                )
            }
            320 | 324 | 325 => {
                let what = match code {
                    320 => "name",
                    324 => "nickname",
                    _ => "profile",
                };
                Rendered::new(
                    Style::Actor,
                    format!(
                        "Change {what}: {} = {}",
                        self.name(RefKind::Actor, num(command, 0)),
                        show(command.param(1))
                    ),
                )
            }
            321 => Rendered::new(
                Style::Actor,
                format!(
                    "Change class: {} to class #{}",
                    self.name(RefKind::Actor, num(command, 0)),
                    num(command, 1)
                ),
            ),
            322 => Rendered::new(
                Style::Actor,
                format!("Change actor images: {}", self.name(RefKind::Actor, num(command, 0))),
            ),
            323 => Rendered::new(
                Style::Actor,
                format!("Change vehicle image: {}", vehicle(num(command, 0))),
            ),
            326 => Rendered::new(
                Style::Actor,
                format!("Change TP: {} {}", self.actor_target(command), self.operand(command, 2, 3, 4)),
            ),
            ENEMY_HP | 332 | 342 => {
                let stat = match code {
                    ENEMY_HP => "HP",
                    332 => "MP",
                    _ => "TP",
                };
                Rendered::new(
                    Style::Battle,
                    format!(
                        "Change enemy {stat}: {} {}",
                        enemy_slot(num(command, 0)),
                        self.operand(command, 1, 2, 3)
                    ),
                )
            }
            ENEMY_STATE => {
                let id = num(command, 2);
                let action = if num(command, 1) == 0 { "add" } else { "remove" };
                Rendered::new(
                    Style::Battle,
                    format!(
                        "Change enemy state: {} {action} {}",
                        enemy_slot(num(command, 0)),
                        self.name(RefKind::State, id)
                    ),
                )
                .with(self.mention(RefKind::State, id))
            }
            334 => Rendered::new(Style::Battle, format!("Enemy recover all: {}", enemy_slot(num(command, 0)))),
            335 => Rendered::new(Style::Battle, format!("Enemy appear: {}", enemy_slot(num(command, 0)))),
            ENEMY_TRANSFORM => {
                let id = num(command, 1);
                Rendered::new(
                    Style::Battle,
                    format!(
                        "Enemy transform: {} into {}",
                        enemy_slot(num(command, 0)),
                        self.name(RefKind::Enemy, id)
                    ),
                )
                .with(self.mention(RefKind::Enemy, id))
            }
            337 => Rendered::new(
                Style::Battle,
                format!("Show battle animation: {} animation #{}", enemy_slot(num(command, 0)), num(command, 1)),
            ),
            FORCE_ACTION => {
                let id = num(command, 2);
                let who = if num(command, 0) == 0 {
                    enemy_slot(num(command, 1))
                } else {
                    self.name(RefKind::Actor, num(command, 1))
                };
                Rendered::new(
                    Style::Battle,
                    format!("Force action: {who} uses {}", self.name(RefKind::Skill, id)),
                )
                .with(self.mention(RefKind::Skill, id))
            }
            340 => Rendered::new(Style::Battle, "Abort battle"),
            351 => Rendered::new(Style::System, "Open menu screen"),
            352 => Rendered::new(Style::System, "Open save screen"),
            353 => Rendered::new(Style::System, "Game over"),
            354 => Rendered::new(Style::System, "Return to title screen"),
            SCRIPT => Rendered {
                lines: continuation_text(),
                ..Rendered::new(Style::Script, format!("Script: {}", show(command.param(0))))
            },
            SCRIPT_LINE => Rendered::new(Style::Script, show(command.param(0))),
            PLUGIN_COMMAND => Rendered::new(Style::Script, format!("Plugin command: {}", show(command.param(0)))),
            PLUGIN_COMMAND_MZ => {
                let mut text = format!(
                    "Plugin command: {} {}",
                    show(command.param(0)),
                    show(command.param(1))
                );
                if let Some(comment) = command.text(2).filter(|s| !s.is_empty()) {
                    text.push_str(&format!(" ({comment})"));
                }
                Rendered::new(Style::Script, text)
            }
            _ => Rendered::new(Style::Unknown, format!("Unknown command {code}")),
        };
        Some(rendered)
    }

    fn control_variables(&self, command: &Command) -> Rendered {
        let (first, last) = (num(command, 0), num(command, 1));
        let target = if first == last {
            self.variable(first)
        } else {
            format!("{}..{}", self.variable(first), self.variable(last))
        };
        let op = match num(command, 2) {
            0 => "=",
            1 => "+=",
            2 => "-=",
            3 => "*=",
            4 => "/=",
            5 => "%=",
            _ => "?=",
        };
        let value = match num(command, 3) {
            0 => num(command, 4).to_string(),
            1 => self.variable(num(command, 4)),
            2 => format!("random {}..{}", num(command, 4), num(command, 5)),
            3 => "game data".to_owned(),
            4 => format!("script {}", show(command.param(4))),
            other => format!("operand type {other}"),
        };
        Rendered::new(Style::Variable, format!("Control variables: {target} {op} {value}"))
    }

    fn conditional(&self, command: &Command) -> Rendered {
        let mut mention = None;
        let condition = match command.int(0) {
            None => "?".to_owned(),
            Some(0) => format!("{} is {}", self.switch(num(command, 1)), on_off(num(command, 2))),
            Some(1) => {
                let op = match num(command, 4) {
                    0 => "==",
                    1 => ">=",
                    2 => "<=",
                    3 => ">",
                    4 => "<",
                    5 => "!=",
                    _ => "?",
                };
                let rhs = if num(command, 2) == 0 {
                    num(command, 3).to_string()
                } else {
                    self.variable(num(command, 3))
                };
                format!("{} {op} {rhs}", self.variable(num(command, 1)))
            }
            Some(2) => format!(
                "self switch {} is {}",
                command.text(1).unwrap_or("A"),
                on_off(num(command, 2))
            ),
            Some(3) => {
                let op = if num(command, 2) == 0 { ">=" } else { "<=" };
                format!("timer {op} {} seconds", num(command, 1))
            }
            Some(4) => {
                let actor = self.name(RefKind::Actor, num(command, 1));
                let detail = match num(command, 2) {
                    0 => "is in the party".to_owned(),
                    1 => format!("is named {}", show(command.param(3))),
                    2 => format!("is class #{}", num(command, 3)),
                    3 => format!("has learned {}", self.name(RefKind::Skill, num(command, 3))),
                    4 => format!("has equipped {}", self.name(RefKind::Weapon, num(command, 3))),
                    5 => format!("has equipped {}", self.name(RefKind::Armor, num(command, 3))),
                    6 => format!("is affected by {}", self.name(RefKind::State, num(command, 3))),
                    other => format!("condition {other}"),
                };
                format!("{actor} {detail}")
            }
            Some(5) => {
                let enemy = enemy_slot(num(command, 1));
                if num(command, 2) == 0 {
                    format!("{enemy} is appeared")
                } else {
                    format!("{enemy} is affected by {}", self.name(RefKind::State, num(command, 3)))
                }
            }
            Some(6) => format!(
                "{} is facing {}",
                subject(num(command, 1)),
                direction(num(command, 2))
            ),
            Some(7) => {
                let op = match num(command, 2) {
                    1 => "<=",
                    2 => "<",
                    _ => ">=",
                };
                format!("gold {op} {}", num(command, 1))
            }
            Some(code @ 8..=10) => {
                let kind = match code {
                    8 => RefKind::Item,
                    9 => RefKind::Weapon,
                    _ => RefKind::Armor,
                };
                let id = num(command, 1);
                mention = self.mention(kind, id);
                let equipped = if code != 8 && command.flag(2) {
                    " (including equipment)"
                } else {
                    ""
                };
                format!("party has {}{equipped}", self.name(kind, id))
            }
            Some(11) => format!("button [{}] is pressed", show(command.param(1))),
            Some(12) => format!("script: {}", show(command.param(1))),
            Some(13) => format!("{} is driven", vehicle(num(command, 1))),
            Some(other) => format!("type {other}"),
        };
        Rendered::new(Style::Conditional, format!("If: {condition}")).with(mention)
    }

    fn battle(&self, command: &Command) -> Rendered {
        let mut flags = Vec::new();
        if command.flag(2) {
            flags.push("can escape");
        }
        if command.flag(3) {
            flags.push("can lose");
        }
        let suffix = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        match num(command, 0) {
            0 => {
                let id = num(command, 1);
                Rendered::new(
                    Style::Battle,
                    format!("Battle processing: {}{suffix}", self.name(RefKind::Troop, id)),
                )
                .with(self.mention(RefKind::Troop, id))
            }
            1 => Rendered::new(
                Style::Battle,
                format!("Battle processing: troop in {}{suffix}", self.variable(num(command, 1))),
            ),
            _ => Rendered::new(Style::Battle, format!("Battle processing: random encounter{suffix}"))
                .with(self.map_id.and_then(|map| self.mention(RefKind::Encounter, map.into()))),
        }
    }
}

/// One move route step: `{"code": n, "parameters": [...]}`.
fn move_step(value: &Json) -> String {
    let code = value.get("code").and_then(Json::as_i64).unwrap_or(0);
    let label = usize::try_from(code - 1)
        .ok()
        .and_then(|i| MOVE_STEPS.get(i))
        .map_or_else(|| format!("Move command {code}"), |s| (*s).to_owned());
    match value.get("parameters").and_then(Json::as_array) {
        Some(params) if !params.is_empty() => {
            let params: Vec<String> = params.iter().map(show).collect();
            format!("{label} {}", params.join(", "))
        }
        _ => label,
    }
}
