//! Minimal Marshal 4.8 encoder for building fixtures.
//!
//! Covers the subset the parser reads back: strings are written with a UTF-8
//! encoding ivar, symbols are linked on repeat, and object links are never
//! emitted.

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;

use crate::value::{Object, Value};

/// Encode a value, version header included.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut writer = Writer::default();
    writer.out.extend_from_slice(&[4, 8]);
    writer.write_value(value);
    writer.out
}

#[derive(Default)]
struct Writer {
    out: Vec<u8>,
    symbols: FastHashMap<String, usize, std::hash::BuildHasherDefault<FxHasher>>,
}

impl Writer {
    fn write_value(&mut self, value: &Value) {
        match value {
            Value::Nil => self.out.push(b'0'),
            Value::Bool(true) => self.out.push(b'T'),
            Value::Bool(false) => self.out.push(b'F'),
            Value::Int(v) if (-(1 << 30)..(1 << 30)).contains(v) => {
                self.out.push(b'i');
                self.write_long(*v);
            }
            Value::Int(v) => {
                self.out.push(b'l');
                self.out.push(if *v < 0 { b'-' } else { b'+' });
                let mut bytes = v.unsigned_abs().to_le_bytes().to_vec();
                while bytes.len() > 2 && bytes[bytes.len() - 1] == 0 && bytes[bytes.len() - 2] == 0 {
                    bytes.truncate(bytes.len() - 2);
                }
                self.write_long((bytes.len() / 2) as i64);
                self.out.extend_from_slice(&bytes);
            }
            Value::Float(v) => {
                self.out.push(b'f');
                let text = if v.is_nan() {
                    "nan".to_string()
                } else if v.is_infinite() {
                    let sign = if *v < 0.0 { "-" } else { "" };
                    format!("{sign}inf")
                } else {
                    v.to_string()
                };
                self.write_bytes(text.as_bytes());
            }
            Value::String(bytes) => {
                self.out.push(b'I');
                self.out.push(b'"');
                self.write_bytes(bytes);
                self.write_long(1);
                self.write_symbol("E");
                self.out.push(b'T');
            }
            Value::Symbol(name) => self.write_symbol(name),
            Value::Array(items) => {
                self.out.push(b'[');
                self.write_long(items.len() as i64);
                for item in items {
                    self.write_value(item);
                }
            }
            Value::Hash(pairs) => {
                self.out.push(b'{');
                self.write_long(pairs.len() as i64);
                for (key, value) in pairs {
                    self.write_value(key);
                    self.write_value(value);
                }
            }
            Value::Object(object) => {
                self.out.push(b'o');
                self.write_object(object);
            }
            Value::Struct(object) => {
                self.out.push(b'S');
                self.write_object(object);
            }
            Value::UserDef(user) => {
                self.out.push(b'u');
                self.write_symbol(&user.class);
                self.write_bytes(&user.data);
            }
            Value::UserMarshal { class, data } => {
                self.out.push(b'U');
                self.write_symbol(class);
                self.write_value(data);
            }
            Value::Class(name) => {
                self.out.push(b'c');
                self.write_bytes(name.as_bytes());
            }
            Value::Module(name) => {
                self.out.push(b'm');
                self.write_bytes(name.as_bytes());
            }
            Value::Regexp(source) => {
                self.out.push(b'/');
                self.write_bytes(source);
                self.out.push(0);
            }
        }
    }

    fn write_object(&mut self, object: &Object) {
        self.write_symbol(&object.class);
        self.write_long(object.ivars.len() as i64);
        for (name, value) in &object.ivars {
            self.write_symbol(name);
            self.write_value(value);
        }
    }

    fn write_symbol(&mut self, name: &str) {
        if let Some(&index) = self.symbols.get(name) {
            self.out.push(b';');
            self.write_long(index as i64);
            return;
        }
        let index = self.symbols.len();
        self.symbols.insert(name.to_string(), index);
        self.out.push(b':');
        self.write_bytes(name.as_bytes());
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_long(bytes.len() as i64);
        self.out.extend_from_slice(bytes);
    }

    fn write_long(&mut self, value: i64) {
        match value {
            0 => self.out.push(0),
            1..=122 => self.out.push((value + 5) as u8),
            -123..=-1 => self.out.push(((value - 5) & 0xFF) as u8),
            _ => {
                let mut buf = Vec::with_capacity(8);
                let mut rest = value;
                loop {
                    buf.push((rest & 0xFF) as u8);
                    rest >>= 8;
                    if (value >= 0 && rest == 0) || (value < 0 && rest == -1) || buf.len() == 8 {
                        break;
                    }
                }
                let count = buf.len() as i8;
                let count = if value < 0 { -count } else { count };
                self.out.push(count as u8);
                self.out.extend_from_slice(&buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_bytes, UserDef};

    #[test]
    fn test_small_values_match_ruby() {
        // Marshal.dump([1, -1, 300, -300, nil])
        let value = Value::Array(vec![
            Value::Int(1),
            Value::Int(-1),
            Value::Int(300),
            Value::Int(-300),
            Value::Nil,
        ]);
        assert_eq!(encode(&value), b"\x04\x08[\x0ai\x06i\xfai\x02\x2c\x01i\xfe\xd4\xfe0");
    }

    #[test]
    fn test_parses_back() {
        let map = Value::Object(Object {
            class: "RPG::Map".into(),
            ivars: vec![
                ("@display_name".into(), Value::String("町".as_bytes().to_vec())),
                ("@width".into(), Value::Int(17)),
                ("@scroll_type".into(), Value::Int(0)),
                ("@note".into(), Value::String(Vec::new())),
                ("@encounter_step".into(), Value::Int(1 << 40)),
                ("@tone".into(), Value::UserDef(UserDef { class: "Tone".into(), data: vec![0; 32] })),
            ],
        });
        let decoded = from_bytes(&encode(&map)).unwrap();
        assert_eq!(decoded, map);
    }
}
