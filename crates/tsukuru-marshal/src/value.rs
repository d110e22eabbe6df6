//! Plain value tree for Marshal data.

use std::borrow::Cow;

use serde_json::{Map, Number, Value as Json};
use tsukuru_common::text::decode_text;

use crate::Table;

/// A Ruby value read from Marshal data.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    /// Fixnum, or a bignum that fits in 64 bits.
    Int(i64),
    /// Float, or a bignum too large for `Int` (approximated).
    Float(f64),
    /// Raw string bytes; decode with [`Value::as_str`].
    String(Vec<u8>),
    Symbol(String),
    Array(Vec<Value>),
    /// Key/value pairs in file order. A hash default is dropped.
    Hash(Vec<(Value, Value)>),
    /// Instance of a plain Ruby class such as `RPG::Event`.
    Object(Object),
    /// Ruby `Struct` instance; members are stored without `@`.
    Struct(Object),
    /// Type serialized with `_dump`.
    UserDef(UserDef),
    /// Type serialized with `marshal_dump`.
    UserMarshal { class: String, data: Box<Value> },
    Class(String),
    Module(String),
    Regexp(Vec<u8>),
}

/// A Ruby object: class name plus instance variables in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    pub class: String,
    pub ivars: Vec<(String, Value)>,
}

impl Object {
    /// Look up an attribute. `name` may be given with or without `@`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let name = name.trim_start_matches('@');
        self.ivars
            .iter()
            .find(|(key, _)| key.trim_start_matches('@') == name)
            .map(|(_, value)| value)
    }
}

/// Opaque bytes produced by a class's `_dump`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDef {
    pub class: String,
    pub data: Vec<u8>,
}

impl UserDef {
    /// Decode an RGSS `Table`.
    pub fn as_table(&self) -> Option<Table> {
        if self.class != "Table" {
            return None;
        }
        Table::from_bytes(&self.data).ok()
    }

    /// Decode an RGSS `Color` or `Tone` into its four components.
    pub fn as_components(&self) -> Option<[f64; 4]> {
        if !matches!(self.class.as_str(), "Color" | "Tone") || self.data.len() < 32 {
            return None;
        }
        let mut out = [0.0; 4];
        for (slot, chunk) in out.iter_mut().zip(self.data.chunks_exact(8)) {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            *slot = f64::from_le_bytes(raw);
        }
        Some(out)
    }
}

static NIL: Value = Value::Nil;

impl Value {
    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer narrowed to `i32`, the width every database id uses.
    pub fn as_i32(&self) -> Option<i32> {
        self.as_i64().and_then(|v| i32::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Text of a string or symbol.
    ///
    /// String bytes are decoded as UTF-8, falling back to Shift_JIS.
    pub fn as_str(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(bytes) => Some(decode_text(bytes).0),
            Self::Symbol(name) => Some(Cow::Borrowed(name)),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Hash(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Object or struct contents.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) | Self::Struct(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_user_def(&self) -> Option<&UserDef> {
        match self {
            Self::UserDef(user) => Some(user),
            _ => None,
        }
    }

    /// Class name of an object, struct or user type.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Object(object) | Self::Struct(object) => Some(&object.class),
            Self::UserDef(user) => Some(&user.class),
            Self::UserMarshal { class, .. } => Some(class),
            _ => None,
        }
    }

    /// Attribute of an object, with or without the `@` prefix.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|object| object.get(name))
    }

    /// First attribute among `names` that is present and not nil.
    ///
    /// Field names drifted between engine generations (`@features` versus
    /// `@traits`, `@hit` versus `@success_rate`); this walks the candidates.
    pub fn get_any(&self, names: &[&str]) -> Option<&Value> {
        names
            .iter()
            .filter_map(|name| self.get(name))
            .find(|value| !value.is_nil())
    }

    /// Attribute or nil, for chaining.
    pub fn field(&self, name: &str) -> &Value {
        self.get(name).unwrap_or(&NIL)
    }

    /// Convert to JSON with the shapes the MV/MZ data files use.
    ///
    /// Object attributes lose their `@` and become camelCase, `Color` and `Tone`
    /// become four-number arrays, and symbols become strings.
    pub fn to_json(&self) -> Json {
        match self {
            Self::Nil => Json::Null,
            Self::Bool(v) => Json::Bool(*v),
            Self::Int(v) => Json::Number((*v).into()),
            Self::Float(v) => Number::from_f64(*v).map_or(Json::Null, Json::Number),
            Self::String(_) | Self::Symbol(_) => {
                Json::String(self.as_str().map(Cow::into_owned).unwrap_or_default())
            }
            Self::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Self::Hash(pairs) => Json::Object(
                pairs
                    .iter()
                    .map(|(key, value)| (json_key(key), value.to_json()))
                    .collect(),
            ),
            Self::Object(object) | Self::Struct(object) => {
                let mut map = Map::new();
                for (name, value) in &object.ivars {
                    map.insert(camel_case(name.trim_start_matches('@')), value.to_json());
                }
                Json::Object(map)
            }
            Self::UserDef(user) => user_def_json(user),
            Self::UserMarshal { data, .. } => data.to_json(),
            Self::Class(name) | Self::Module(name) => Json::String(name.clone()),
            Self::Regexp(source) => Json::String(decode_text(source).0.into_owned()),
        }
    }
}

fn json_key(key: &Value) -> String {
    match key {
        Value::Int(v) => v.to_string(),
        other => other
            .as_str()
            .map(Cow::into_owned)
            .unwrap_or_else(|| other.to_json().to_string()),
    }
}

fn user_def_json(user: &UserDef) -> Json {
    if let Some(components) = user.as_components() {
        return Json::Array(
            components
                .iter()
                .map(|c| Number::from_f64(*c).map_or(Json::Null, Json::Number))
                .collect(),
        );
    }
    if let Some(table) = user.as_table() {
        let mut map = Map::new();
        map.insert("xsize".into(), table.xsize().into());
        map.insert("ysize".into(), table.ysize().into());
        map.insert("zsize".into(), table.zsize().into());
        map.insert(
            "data".into(),
            Json::Array(table.data().iter().map(|v| Json::from(*v)).collect()),
        );
        return Json::Object(map);
    }
    Json::Null
}

/// `character_name` to `characterName`.
pub(crate) fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '_' && !out.is_empty() {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn audio(name: &str) -> Value {
        Value::Object(Object {
            class: "RPG::BGM".into(),
            ivars: vec![
                ("@name".into(), Value::String(name.as_bytes().to_vec())),
                ("@volume".into(), Value::Int(90)),
                ("@pitch".into(), Value::Int(100)),
            ],
        })
    }

    #[test]
    fn test_get_with_or_without_prefix() {
        let bgm = audio("Town1");
        assert_eq!(bgm.get("@volume"), Some(&Value::Int(90)));
        assert_eq!(bgm.get("volume"), Some(&Value::Int(90)));
        assert!(bgm.get("pan").is_none());
        assert!(bgm.field("pan").is_nil());
        assert_eq!(bgm.class_name(), Some("RPG::BGM"));
    }

    #[test]
    fn test_get_any_skips_nil() {
        let skill = Value::Object(Object {
            class: "RPG::Skill".into(),
            ivars: vec![("@hit".into(), Value::Nil), ("@success_rate".into(), Value::Int(95))],
        });
        assert_eq!(skill.get_any(&["@hit", "@success_rate"]), Some(&Value::Int(95)));
        assert_eq!(skill.get_any(&["@missing"]), None);
    }

    #[test]
    fn test_to_json_objects() {
        let page = Value::Object(Object {
            class: "RPG::Event::Page::Graphic".into(),
            ivars: vec![
                ("@character_name".into(), Value::String(b"Actor1".to_vec())),
                ("@character_index".into(), Value::Int(3)),
            ],
        });
        assert_eq!(page.to_json(), json!({"characterName": "Actor1", "characterIndex": 3}));
        assert_eq!(audio("Battle").to_json()["name"], "Battle");
    }

    #[test]
    fn test_to_json_tone_and_hash() {
        let mut data = Vec::new();
        for c in [-68.0f64, -68.0, 0.0, 68.0] {
            data.extend_from_slice(&c.to_le_bytes());
        }
        let tone = Value::UserDef(UserDef {
            class: "Tone".into(),
            data,
        });
        assert_eq!(tone.to_json(), json!([-68.0, -68.0, 0.0, 68.0]));

        let hash = Value::Hash(vec![(Value::Int(1), Value::Symbol("a".into()))]);
        assert_eq!(hash.to_json(), json!({"1": "a"}));
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("drop_item1"), "dropItem1");
        assert_eq!(camel_case("battler_hue"), "battlerHue");
        assert_eq!(camel_case("name"), "name");
        assert_eq!(camel_case("_private"), "_private");
    }
}
