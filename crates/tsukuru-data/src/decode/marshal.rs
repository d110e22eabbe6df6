//! VX and VX Ace Marshal data files.
//!
//! Records are built straight from the Marshal value tree. Attribute names
//! changed between the two engines (`@features` was `@element_set` and
//! friends, `@params` was `@atk`/`@def`/`@spi`/`@agi`), so every field lists
//! the names it may appear under and the older layouts are converted into the
//! trait and effect codes the MV/MZ files use.

use tsukuru_marshal::{Object, Table, Value};

use super::{bad_root, Rows};
use crate::handle::DataFile;
use crate::model::{
    Actor, Armor, AudioFile, Class, Command, CommonEvent, Damage, DropItem, Effect, Encounter, Enemy, EnemyAction,
    EventPage, EventRecord, Item, Learning, LegacyDamage, MapInfo, MapRecord, PageConditions, PageImage, Skill, State,
    SystemRecord, Tileset, Trait, Troop, TroopMember, TroopPage, Weapon, TILESET_SLOTS,
};
use crate::{Error, Result};

// Trait and effect codes the legacy set fields are mapped onto.
const TRAIT_ELEMENT_RATE: i32 = 11;
const TRAIT_STATE_RESIST: i32 = 14;
const TRAIT_ATTACK_ELEMENT: i32 = 31;
const TRAIT_ATTACK_STATE: i32 = 32;
const EFFECT_RECOVER_HP: i32 = 11;
const EFFECT_RECOVER_MP: i32 = 12;
const EFFECT_ADD_STATE: i32 = 21;
const EFFECT_REMOVE_STATE: i32 = 22;

/// Conversion from a Marshal object into a unified record.
pub(crate) trait FromMarshal: Sized {
    fn from_marshal(value: &Value) -> Result<Self>;
}

fn parse(file: &DataFile) -> Result<Value> {
    Ok(tsukuru_marshal::from_bytes(&file.bytes)?)
}

/// Decode each non-nil element of a top-level array on its own.
pub(super) fn collection<T: FromMarshal>(file: &DataFile) -> Result<Rows<T>> {
    let root = parse(file)?;
    let Some(elements) = root.as_array() else {
        return Err(bad_root(file, "an array"));
    };
    Ok(elements
        .iter()
        .enumerate()
        .filter(|(_, element)| !element.is_nil())
        .map(|(index, element)| (index, T::from_marshal(element)))
        .collect())
}

/// `MapInfos` is a hash from map id to `RPG::MapInfo`.
pub(super) fn map_infos(file: &DataFile) -> Result<Rows<MapInfo>> {
    let root = parse(file)?;
    let Some(pairs) = root.as_hash() else {
        return Err(bad_root(file, "a hash"));
    };
    Ok(keyed_rows(pairs)
        .into_iter()
        .map(|(id, value)| {
            let info = MapInfo::from_marshal(value).map(|mut info| {
                info.id = id;
                info
            });
            (id as usize, info)
        })
        .collect())
}

pub(super) fn map(file: &DataFile) -> Result<(MapRecord, Rows<EventRecord>)> {
    let root = parse(file)?;
    let Some(object) = root.as_object() else {
        return Err(bad_root(file, "an object"));
    };
    let f = Fields(object);

    let map = MapRecord {
        display_name: f.text(&["display_name"]),
        tileset_id: f.int(&["tileset_id"]),
        width: f.int(&["width"]),
        height: f.int(&["height"]),
        autoplay_bgm: f.flag(&["autoplay_bgm"]),
        bgm: f.value(&["bgm"]).and_then(Value::as_object).map(audio).unwrap_or_default(),
        parallax_name: f.text(&["parallax_name"]),
        encounter_step: f.int(&["encounter_step"]),
        encounter_list: f.list(&["encounter_list"]).iter().filter_map(encounter).collect(),
        note: f.text(&["note"]),
        data: f.table(&["data"]).map(|table| unsigned(&table)).unwrap_or_default(),
        ..Default::default()
    };

    let events = f
        .value(&["events"])
        .and_then(Value::as_hash)
        .map(keyed_rows)
        .unwrap_or_default()
        .into_iter()
        .map(|(id, value)| {
            let event = EventRecord::from_marshal(value).map(|mut event| {
                event.id = id;
                event
            });
            (id as usize, event)
        })
        .collect();
    Ok((map, events))
}

pub(super) fn system(file: &DataFile) -> Result<SystemRecord> {
    let root = parse(file)?;
    let Some(object) = root.as_object() else {
        return Err(bad_root(file, "an object"));
    };
    let f = Fields(object);
    let terms = f.object(&["terms"]);

    let currency_unit = match terms {
        Some(terms) if f.value(&["currency_unit"]).is_none() => terms.text(&["gold"]),
        _ => f.text(&["currency_unit"]),
    };
    // VX Ace numbers equipment slots from 0; shift them to the 1-based layout.
    let equip_types: Vec<String> = terms
        .map(|terms| terms.texts(&["etypes"]))
        .filter(|etypes| !etypes.is_empty())
        .map(|etypes| std::iter::once(String::new()).chain(etypes).collect())
        .unwrap_or_default();

    Ok(SystemRecord {
        game_title: f.text(&["game_title"]),
        currency_unit,
        switches: f.texts(&["switches"]),
        variables: f.texts(&["variables"]),
        elements: f.texts(&["elements"]),
        weapon_types: f.texts(&["weapon_types"]),
        armor_types: f.texts(&["armor_types"]),
        equip_types,
        skill_types: f.texts(&["skill_types"]),
        encryption_key: None,
        has_encrypted_images: false,
        has_encrypted_audio: false,
        start_map_id: f.int(&["start_map_id"]),
        start_x: f.int(&["start_x"]),
        start_y: f.int(&["start_y"]),
        party_members: f.ints(&["party_members"]),
    })
}

/// Pairs of a hash keyed by positive integer id, in id order.
fn keyed_rows(pairs: &[(Value, Value)]) -> Vec<(i32, &Value)> {
    let mut rows: Vec<(i32, &Value)> = pairs
        .iter()
        .filter_map(|(key, value)| key.as_i32().filter(|&id| id > 0).map(|id| (id, value)))
        .collect();
    rows.sort_by_key(|(id, _)| *id);
    rows
}

/// Attribute reader over one object. Each lookup takes every name the
/// attribute went by and uses the first that is present and not nil.
#[derive(Clone, Copy)]
struct Fields<'a>(&'a Object);

impl<'a> Fields<'a> {
    fn of(value: &'a Value) -> Result<Self> {
        match value.as_object() {
            Some(object) => Ok(Self(object)),
            None => Err(Error::schema(
                value.class_name().unwrap_or("value"),
                "expected an object",
            )),
        }
    }

    fn value(&self, names: &[&str]) -> Option<&'a Value> {
        names
            .iter()
            .filter_map(|name| self.0.get(name))
            .find(|value| !value.is_nil())
    }

    fn has(&self, names: &[&str]) -> bool {
        self.value(names).is_some()
    }

    fn int(&self, names: &[&str]) -> i32 {
        self.int_or(names, 0)
    }

    fn int_or(&self, names: &[&str], default: i32) -> i32 {
        self.value(names).and_then(to_int).unwrap_or(default)
    }

    fn float(&self, names: &[&str]) -> f64 {
        self.value(names).and_then(Value::as_f64).unwrap_or(0.0)
    }

    fn flag(&self, names: &[&str]) -> bool {
        self.flag_or(names, false)
    }

    fn flag_or(&self, names: &[&str], default: bool) -> bool {
        match self.value(names) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Int(v)) => *v != 0,
            _ => default,
        }
    }

    fn text(&self, names: &[&str]) -> String {
        self.value(names).map(to_text).unwrap_or_default()
    }

    fn list(&self, names: &[&str]) -> &'a [Value] {
        self.value(names).and_then(Value::as_array).unwrap_or_default()
    }

    fn object(&self, names: &[&str]) -> Option<Fields<'a>> {
        self.value(names).and_then(Value::as_object).map(Fields)
    }

    fn table(&self, names: &[&str]) -> Option<Table> {
        self.value(names)
            .and_then(Value::as_user_def)
            .and_then(|user| user.as_table())
    }

    /// Integer list from an array or a `Table`.
    fn ints(&self, names: &[&str]) -> Vec<i32> {
        match self.value(names) {
            Some(Value::Array(items)) => items.iter().map(|v| to_int(v).unwrap_or(0)).collect(),
            Some(Value::UserDef(user)) => user
                .as_table()
                .map(|table| table.data().iter().map(|&v| i32::from(v)).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Name list; nil slots become empty names.
    fn texts(&self, names: &[&str]) -> Vec<String> {
        self.list(names).iter().map(to_text).collect()
    }
}

fn to_int(value: &Value) -> Option<i32> {
    match value {
        Value::Int(_) => value.as_i32(),
        Value::Float(f) if f.is_finite() => Some(*f as i32),
        Value::Bool(b) => Some(i32::from(*b)),
        _ => None,
    }
}

fn to_text(value: &Value) -> String {
    value.as_str().map(|s| s.into_owned()).unwrap_or_default()
}

/// Tile ids and passage flags are stored as unsigned 16-bit values.
fn unsigned(table: &Table) -> Vec<i32> {
    table.data().iter().map(|&v| i32::from(v as u16)).collect()
}

/// Common header fields every database record carries.
struct Header {
    id: i32,
    name: String,
    description: String,
    icon_index: i32,
    note: String,
}

fn header(f: Fields<'_>) -> Header {
    Header {
        id: f.int(&["id"]),
        name: f.text(&["name"]),
        description: f.text(&["description"]),
        icon_index: f.int(&["icon_index"]),
        note: f.text(&["note"]),
    }
}

/// The eight battle parameters: mhp, mmp, atk, def, mat, mdf, agi, luk.
fn params(f: Fields<'_>) -> Vec<i32> {
    let mut params = f.ints(&["params"]);
    if params.is_empty() {
        params = vec![
            f.int(&["maxhp", "mhp"]),
            f.int(&["maxmp", "maxsp", "mmp"]),
            f.int(&["atk"]),
            f.int(&["def"]),
            f.int(&["spi", "mat"]),
            f.int(&["mdf"]),
            f.int(&["agi"]),
            f.int(&["luk"]),
        ];
    }
    params.resize(8, 0);
    params
}

fn traits(f: Fields<'_>) -> Vec<Trait> {
    f.list(&["features", "traits"])
        .iter()
        .filter_map(Value::as_object)
        .map(|object| {
            let t = Fields(object);
            Trait {
                code: t.int(&["code"]),
                data_id: t.int(&["data_id"]),
                value: t.float(&["value"]),
            }
        })
        .collect()
}

/// Traits for each id in the legacy `names` set.
fn set_traits(f: Fields<'_>, names: &[&str], code: i32, value: f64) -> impl Iterator<Item = Trait> {
    f.ints(names).into_iter().map(move |data_id| Trait { code, data_id, value })
}

fn effects(f: Fields<'_>) -> Vec<Effect> {
    let mut effects: Vec<Effect> = f
        .list(&["effects"])
        .iter()
        .filter_map(Value::as_object)
        .map(|object| {
            let e = Fields(object);
            Effect {
                code: e.int(&["code"]),
                data_id: e.int(&["data_id"]),
                value1: e.float(&["value1"]),
                value2: e.float(&["value2"]),
            }
        })
        .collect();

    let recovery = [
        (EFFECT_RECOVER_HP, "hp_recovery_rate", "hp_recovery"),
        (EFFECT_RECOVER_MP, "mp_recovery_rate", "mp_recovery"),
    ];
    for (code, rate, amount) in recovery {
        let (rate, amount) = (f.float(&[rate]), f.float(&[amount]));
        if rate != 0.0 || amount != 0.0 {
            effects.push(Effect {
                code,
                data_id: 0,
                value1: rate / 100.0,
                value2: amount,
            });
        }
    }
    for (code, name) in [
        (EFFECT_ADD_STATE, "plus_state_set"),
        (EFFECT_REMOVE_STATE, "minus_state_set"),
    ] {
        effects.extend(f.ints(&[name]).into_iter().map(|data_id| Effect {
            code,
            data_id,
            value1: 1.0,
            value2: 0.0,
        }));
    }
    effects
}

fn damage(f: Fields<'_>) -> Damage {
    let Some(d) = f.object(&["damage"]) else {
        return Damage::default();
    };
    Damage {
        kind: d.int(&["type"]),
        element_id: d.int(&["element_id"]),
        formula: d.text(&["formula"]),
        variance: d.int(&["variance"]),
        critical: d.flag(&["critical"]),
    }
}

fn legacy_damage(f: Fields<'_>) -> Option<LegacyDamage> {
    if !f.has(&["base_damage"]) {
        return None;
    }
    Some(LegacyDamage {
        base_damage: f.int(&["base_damage"]),
        atk_f: f.int(&["atk_f"]),
        spi_f: f.int(&["spi_f", "mat_f"]),
        variance: f.int(&["variance"]),
        element_set: f.ints(&["element_set"]),
    })
}

fn commands(f: Fields<'_>) -> Vec<Command> {
    f.list(&["list"])
        .iter()
        .filter_map(Value::as_object)
        .map(|object| {
            let c = Fields(object);
            Command::new(
                c.int(&["code"]),
                c.int(&["indent"]),
                c.list(&["parameters"]).iter().map(Value::to_json).collect(),
            )
        })
        .collect()
}

fn audio(object: &Object) -> AudioFile {
    let f = Fields(object);
    AudioFile {
        name: f.text(&["name"]),
        volume: f.int_or(&["volume"], 100),
        pitch: f.int_or(&["pitch"], 100),
        pan: f.int(&["pan"]),
    }
}

/// VX Ace stores encounter objects; VX stores bare troop ids.
fn encounter(value: &Value) -> Option<Encounter> {
    match value {
        Value::Int(_) => value.as_i32().map(|troop_id| Encounter {
            troop_id,
            weight: 1,
            region_set: Vec::new(),
        }),
        _ => value.as_object().map(|object| {
            let f = Fields(object);
            Encounter {
                troop_id: f.int(&["troop_id"]),
                weight: f.int_or(&["weight"], 1),
                region_set: f.ints(&["region_set"]),
            }
        }),
    }
}

impl FromMarshal for MapInfo {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        Ok(Self {
            id: 0,
            name: f.text(&["name"]),
            parent_id: f.int(&["parent_id"]),
            order: f.int(&["order"]),
            expanded: f.flag(&["expanded"]),
        })
    }
}

impl FromMarshal for EventRecord {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        let pages = f
            .list(&["pages"])
            .iter()
            .filter(|page| !page.is_nil())
            .map(EventPage::from_marshal)
            .collect::<Result<_>>()?;
        Ok(Self {
            id: f.int(&["id"]),
            name: f.text(&["name"]),
            x: f.int(&["x"]),
            y: f.int(&["y"]),
            note: f.text(&["note"]),
            pages,
        })
    }
}

impl FromMarshal for EventPage {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        let conditions = f
            .object(&["condition", "conditions"])
            .map(|c| PageConditions {
                switch1_valid: c.flag(&["switch1_valid"]),
                switch1_id: c.int_or(&["switch1_id"], 1),
                switch2_valid: c.flag(&["switch2_valid"]),
                switch2_id: c.int_or(&["switch2_id"], 1),
                variable_valid: c.flag(&["variable_valid"]),
                variable_id: c.int_or(&["variable_id"], 1),
                variable_value: c.int(&["variable_value"]),
                self_switch_valid: c.flag(&["self_switch_valid"]),
                self_switch_ch: c.text(&["self_switch_ch"]),
                item_valid: c.flag(&["item_valid"]),
                item_id: c.int_or(&["item_id"], 1),
                actor_valid: c.flag(&["actor_valid"]),
                actor_id: c.int_or(&["actor_id"], 1),
            })
            .unwrap_or_default();
        let image = f
            .object(&["graphic", "image"])
            .map(|g| PageImage {
                tile_id: g.int(&["tile_id"]),
                character_name: g.text(&["character_name"]),
                character_index: g.int(&["character_index"]),
                direction: g.int_or(&["direction"], 2),
                pattern: g.int(&["pattern"]),
            })
            .unwrap_or_default();
        Ok(Self {
            trigger: f.int(&["trigger"]),
            conditions,
            image,
            priority_type: f.int_or(&["priority_type"], 1),
            commands: commands(f),
        })
    }
}

impl FromMarshal for Item {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        let Header {
            id,
            name,
            description,
            icon_index,
            note,
        } = header(f);
        let itype_id = match f.int(&["itype_id"]) {
            id if id > 0 => id,
            _ if f.int(&["kind"]) == 1 => 2,
            _ => 1,
        };
        Ok(Self {
            id,
            name,
            description,
            icon_index,
            note,
            itype_id,
            price: f.int(&["price"]),
            consumable: f.flag_or(&["consumable"], true),
            scope: f.int(&["scope"]),
            occasion: f.int(&["occasion"]),
            speed: f.int(&["speed"]),
            success_rate: f.int_or(&["success_rate", "hit"], 100),
            repeats: f.int_or(&["repeats"], 1),
            tp_gain: f.int(&["tp_gain"]),
            hit_type: f.int(&["hit_type"]),
            animation_id: f.int(&["animation_id"]),
            damage: damage(f),
            effects: effects(f),
        })
    }
}

impl FromMarshal for Skill {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        let Header {
            id,
            name,
            description,
            icon_index,
            note,
        } = header(f);
        Ok(Self {
            id,
            name,
            description,
            icon_index,
            note,
            stype_id: f.int(&["stype_id"]),
            scope: f.int(&["scope"]),
            occasion: f.int(&["occasion"]),
            mp_cost: f.int(&["mp_cost"]),
            tp_cost: f.int(&["tp_cost"]),
            tp_gain: f.int(&["tp_gain"]),
            speed: f.int(&["speed"]),
            success_rate: f.int_or(&["success_rate", "hit"], 100),
            repeats: f.int_or(&["repeats"], 1),
            hit_type: f.int(&["hit_type"]),
            animation_id: f.int(&["animation_id"]),
            damage: damage(f),
            legacy_damage: legacy_damage(f),
            effects: effects(f),
            message1: f.text(&["message1"]),
            message2: f.text(&["message2"]),
        })
    }
}

impl FromMarshal for Weapon {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        let Header {
            id,
            name,
            description,
            icon_index,
            note,
        } = header(f);
        let mut traits = traits(f);
        traits.extend(set_traits(f, &["element_set"], TRAIT_ATTACK_ELEMENT, 0.0));
        traits.extend(set_traits(f, &["state_set"], TRAIT_ATTACK_STATE, 1.0));
        Ok(Self {
            id,
            name,
            description,
            icon_index,
            note,
            wtype_id: f.int(&["wtype_id"]),
            // VX Ace weapons use slot 0; VX has no slot field.
            etype_id: f.int(&["etype_id"]) + 1,
            price: f.int(&["price"]),
            animation_id: f.int(&["animation_id"]),
            params: params(f),
            traits,
        })
    }
}

impl FromMarshal for Armor {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        let Header {
            id,
            name,
            description,
            icon_index,
            note,
        } = header(f);
        let mut traits = traits(f);
        traits.extend(set_traits(f, &["element_set"], TRAIT_ELEMENT_RATE, 0.5));
        traits.extend(set_traits(f, &["state_set"], TRAIT_STATE_RESIST, 1.0));
        // VX `kind`: 0 shield, 1 head, 2 body, 3 accessory.
        let etype_id = if f.has(&["etype_id"]) {
            f.int(&["etype_id"]) + 1
        } else {
            f.int(&["kind"]) + 2
        };
        Ok(Self {
            id,
            name,
            description,
            icon_index,
            note,
            atype_id: f.int(&["atype_id"]),
            etype_id,
            price: f.int(&["price"]),
            params: params(f),
            traits,
        })
    }
}

fn drop_item(f: Fields<'_>) -> DropItem {
    let kind = f.int(&["kind"]);
    let data_id = if f.has(&["data_id"]) {
        f.int(&["data_id"])
    } else {
        match kind {
            1 => f.int(&["item_id"]),
            2 => f.int(&["weapon_id"]),
            3 => f.int(&["armor_id"]),
            _ => 0,
        }
    };
    DropItem {
        kind,
        data_id,
        denominator: f.int_or(&["denominator"], 1).max(1),
    }
}

impl FromMarshal for Enemy {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        let mut drop_items: Vec<DropItem> = f
            .list(&["drop_items"])
            .iter()
            .filter_map(Value::as_object)
            .map(|object| drop_item(Fields(object)))
            .collect();
        drop_items.extend(
            ["drop_item1", "drop_item2"]
                .into_iter()
                .filter_map(|name| f.object(&[name]))
                .map(drop_item),
        );
        let actions = f
            .list(&["actions"])
            .iter()
            .filter_map(Value::as_object)
            .map(|object| {
                let a = Fields(object);
                EnemyAction {
                    skill_id: a.int(&["skill_id"]),
                    rating: a.int_or(&["rating"], 5),
                    condition_type: a.int(&["condition_type"]),
                    condition_param1: a.float(&["condition_param1"]),
                    condition_param2: a.float(&["condition_param2"]),
                }
            })
            .collect();
        Ok(Self {
            id: f.int(&["id"]),
            name: f.text(&["name"]),
            note: f.text(&["note"]),
            battler_name: f.text(&["battler_name"]),
            battler_hue: f.int(&["battler_hue"]),
            params: params(f),
            exp: f.int(&["exp"]),
            gold: f.int(&["gold"]),
            drop_items,
            actions,
            traits: traits(f),
        })
    }
}

impl FromMarshal for Troop {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        let members = f
            .list(&["members"])
            .iter()
            .filter_map(Value::as_object)
            .map(|object| {
                let m = Fields(object);
                TroopMember {
                    enemy_id: m.int(&["enemy_id"]),
                    x: m.int(&["x"]),
                    y: m.int(&["y"]),
                    hidden: m.flag(&["hidden"]),
                }
            })
            .collect();
        let pages = f
            .list(&["pages"])
            .iter()
            .filter_map(Value::as_object)
            .map(|object| {
                let p = Fields(object);
                TroopPage {
                    span: p.int(&["span"]),
                    commands: commands(p),
                }
            })
            .collect();
        Ok(Self {
            id: f.int(&["id"]),
            name: f.text(&["name"]),
            members,
            pages,
        })
    }
}

impl FromMarshal for State {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        Ok(Self {
            id: f.int(&["id"]),
            name: f.text(&["name"]),
            icon_index: f.int(&["icon_index"]),
            note: f.text(&["note"]),
            restriction: f.int(&["restriction"]),
            priority: f.int(&["priority"]),
            min_turns: f.int(&["min_turns"]),
            max_turns: f.int(&["max_turns", "hold_turn"]),
            remove_at_battle_end: f.flag(&["remove_at_battle_end", "battle_only"]),
            message1: f.text(&["message1"]),
            traits: traits(f),
        })
    }
}

impl FromMarshal for Actor {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        let mut equips = f.ints(&["equips"]);
        if equips.is_empty() {
            equips = ["weapon_id", "armor1_id", "armor2_id", "armor3_id", "armor4_id"]
                .into_iter()
                .map(|name| f.int(&[name]))
                .collect();
        }
        Ok(Self {
            id: f.int(&["id"]),
            name: f.text(&["name"]),
            nickname: f.text(&["nickname"]),
            class_id: f.int(&["class_id"]),
            initial_level: f.int_or(&["initial_level"], 1),
            max_level: f.int_or(&["max_level"], 99),
            face_name: f.text(&["face_name"]),
            face_index: f.int(&["face_index"]),
            character_name: f.text(&["character_name"]),
            character_index: f.int(&["character_index"]),
            equips,
            profile: f.text(&["description", "profile"]),
            note: f.text(&["note"]),
            traits: traits(f),
        })
    }
}

impl FromMarshal for Class {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        // VX Ace keeps a param x level table on the class.
        let params = f
            .table(&["params"])
            .map(|table| {
                (0..table.xsize())
                    .map(|param| {
                        (0..table.ysize())
                            .map(|level| table.get(param, level, 0).map_or(0, i32::from))
                            .collect()
                    })
                    .collect()
            })
            .unwrap_or_default();
        let learnings = f
            .list(&["learnings"])
            .iter()
            .filter_map(Value::as_object)
            .map(|object| {
                let l = Fields(object);
                Learning {
                    level: l.int(&["level"]),
                    skill_id: l.int(&["skill_id"]),
                }
            })
            .collect();
        Ok(Self {
            id: f.int(&["id"]),
            name: f.text(&["name"]),
            note: f.text(&["note"]),
            exp_params: f.ints(&["exp_params"]),
            params,
            learnings,
            traits: traits(f),
        })
    }
}

impl FromMarshal for CommonEvent {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        Ok(Self {
            id: f.int(&["id"]),
            name: f.text(&["name"]),
            trigger: f.int(&["trigger"]),
            switch_id: f.int(&["switch_id"]),
            commands: commands(f),
        })
    }
}

impl FromMarshal for Tileset {
    fn from_marshal(value: &Value) -> Result<Self> {
        let f = Fields::of(value)?;
        let mut tileset_names = f.texts(&["tileset_names"]);
        if tileset_names.is_empty() {
            // A single sheet plus autotiles; spread them over the A1-A5 and B slots.
            tileset_names = vec![String::new(); TILESET_SLOTS];
            for (slot, name) in tileset_names.iter_mut().zip(f.texts(&["autotile_names"])).take(5) {
                *slot = name;
            }
            tileset_names[5] = f.text(&["tileset_name"]);
        }
        Ok(Self {
            id: f.int(&["id"]),
            name: f.text(&["name"]),
            note: f.text(&["note"]),
            mode: f.int(&["mode"]),
            tileset_names,
            flags: f.table(&["flags", "passages"]).map(|table| unsigned(&table)).unwrap_or_default(),
        })
    }
}
