//! Marshal 4.8 parser.

use tsukuru_common::text::decode_lossy;
use tsukuru_common::BinaryReader;

use crate::value::{Object, UserDef, Value};
use crate::{Error, Result};

/// Deepest nesting accepted before giving up.
///
/// Each level costs several parser frames, so this stays well inside the
/// default 2 MiB thread stack even in debug builds. Engine data nests about
/// twenty levels deep.
pub const MAX_DEPTH: usize = 64;

const VERSION: [u8; 2] = [4, 8];

/// Bytes re-read for links, as a multiple of the input size. Links expand
/// into copies, so chains of links to linked containers grow exponentially.
const REPLAY_FACTOR: usize = 64;

mod tag {
    pub const NIL: u8 = b'0';
    pub const TRUE: u8 = b'T';
    pub const FALSE: u8 = b'F';
    pub const FIXNUM: u8 = b'i';
    pub const BIGNUM: u8 = b'l';
    pub const FLOAT: u8 = b'f';
    pub const STRING: u8 = b'"';
    pub const SYMBOL: u8 = b':';
    pub const SYMLINK: u8 = b';';
    pub const LINK: u8 = b'@';
    pub const IVAR: u8 = b'I';
    pub const ARRAY: u8 = b'[';
    pub const HASH: u8 = b'{';
    pub const HASH_DEFAULT: u8 = b'}';
    pub const OBJECT: u8 = b'o';
    pub const STRUCT: u8 = b'S';
    pub const USER_DEF: u8 = b'u';
    pub const USER_MARSHAL: u8 = b'U';
    pub const EXTENDED: u8 = b'e';
    pub const USER_CLASS: u8 = b'C';
    pub const CLASS: u8 = b'c';
    pub const MODULE: u8 = b'm';
    pub const OLD_MODULE: u8 = b'M';
    pub const REGEXP: u8 = b'/';
}

/// Parse one Marshal-encoded value.
///
/// Trailing bytes after the value are ignored.
pub fn from_bytes(data: &[u8]) -> Result<Value> {
    let mut reader = BinaryReader::new(data);
    reader.expect_magic(&VERSION)?;

    let mut parser = Parser {
        data,
        reader,
        symbols: Vec::new(),
        objects: Vec::new(),
        depth: 0,
        replay_budget: data.len().saturating_mul(REPLAY_FACTOR),
    };
    parser.read_value()
}

/// Entry of the `@` link table.
#[derive(Debug, Clone)]
enum Slot {
    /// Registered, children still being read.
    Pending,
    /// Leaf values are cheap to keep.
    Done(Value),
    /// Containers are re-read from their bytes when linked, so the table
    /// never holds a second copy of every subtree.
    Span { start: usize, end: usize, symbols: usize },
}

struct Parser<'a> {
    data: &'a [u8],
    reader: BinaryReader<'a>,
    symbols: Vec<String>,
    /// Link targets in registration order. A slot is reserved before an
    /// object's children are read and filled afterwards.
    objects: Vec<Slot>,
    depth: usize,
    replay_budget: usize,
}

impl Parser<'_> {
    fn read_value(&mut self) -> Result<Value> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::DepthExceeded(MAX_DEPTH));
        }
        let value = self.read_tagged();
        self.depth -= 1;
        value
    }

    fn read_tagged(&mut self) -> Result<Value> {
        let position = self.reader.position();
        let tag = self.reader.read_u8()?;

        match tag {
            tag::NIL => Ok(Value::Nil),
            tag::TRUE => Ok(Value::Bool(true)),
            tag::FALSE => Ok(Value::Bool(false)),
            tag::FIXNUM => self.read_fixnum().map(Value::Int),
            tag::SYMBOL => self.read_symbol_body().map(Value::Symbol),
            tag::SYMLINK => self.read_symlink().map(Value::Symbol),
            tag::LINK => self.read_link(),
            tag::IVAR => self.read_with_ivars(),
            tag::EXTENDED => {
                self.read_symbol()?;
                self.read_value()
            }
            tag::USER_CLASS => {
                self.read_symbol()?;
                self.read_value()
            }
            tag::STRING
            | tag::FLOAT
            | tag::BIGNUM
            | tag::ARRAY
            | tag::HASH
            | tag::HASH_DEFAULT
            | tag::OBJECT
            | tag::STRUCT
            | tag::USER_DEF
            | tag::USER_MARSHAL
            | tag::CLASS
            | tag::MODULE
            | tag::OLD_MODULE
            | tag::REGEXP => {
                let symbols = self.symbols.len();
                let slot = self.objects.len();
                self.objects.push(Slot::Pending);
                let value = self.read_registered(tag)?;
                self.objects[slot] = match value {
                    Value::Array(_) | Value::Hash(_) | Value::Object(_) | Value::Struct(_) | Value::UserMarshal { .. } => {
                        Slot::Span {
                            start: position,
                            end: self.reader.position(),
                            symbols,
                        }
                    }
                    _ => Slot::Done(value.clone()),
                };
                Ok(value)
            }
            _ => Err(Error::UnknownTag { tag, position }),
        }
    }

    /// Types that occupy a slot in the object table.
    fn read_registered(&mut self, tag: u8) -> Result<Value> {
        match tag {
            tag::STRING => self.read_byte_string().map(Value::String),
            tag::FLOAT => self.read_float().map(Value::Float),
            tag::BIGNUM => self.read_bignum(),
            tag::ARRAY => {
                let len = self.read_length()?;
                let mut items = Vec::with_capacity(len.min(self.reader.remaining()));
                for _ in 0..len {
                    items.push(self.read_value()?);
                }
                Ok(Value::Array(items))
            }
            tag::HASH | tag::HASH_DEFAULT => {
                let len = self.read_length()?;
                let mut pairs = Vec::with_capacity(len.min(self.reader.remaining()));
                for _ in 0..len {
                    let key = self.read_value()?;
                    let value = self.read_value()?;
                    pairs.push((key, value));
                }
                if tag == tag::HASH_DEFAULT {
                    self.read_value()?;
                }
                Ok(Value::Hash(pairs))
            }
            tag::OBJECT => {
                let class = self.read_symbol()?;
                let ivars = self.read_pairs()?;
                Ok(Value::Object(Object { class, ivars }))
            }
            tag::STRUCT => {
                let class = self.read_symbol()?;
                let ivars = self.read_pairs()?;
                Ok(Value::Struct(Object { class, ivars }))
            }
            tag::USER_DEF => {
                let class = self.read_symbol()?;
                let data = self.read_byte_string()?;
                Ok(Value::UserDef(UserDef { class, data }))
            }
            tag::USER_MARSHAL => {
                let class = self.read_symbol()?;
                let data = Box::new(self.read_value()?);
                Ok(Value::UserMarshal { class, data })
            }
            tag::CLASS => Ok(Value::Class(decode_lossy(&self.read_byte_string()?))),
            tag::MODULE | tag::OLD_MODULE => Ok(Value::Module(decode_lossy(&self.read_byte_string()?))),
            tag::REGEXP => {
                let source = self.read_byte_string()?;
                self.reader.read_u8()?;
                Ok(Value::Regexp(source))
            }
            _ => Err(Error::UnknownTag {
                tag,
                position: self.reader.position(),
            }),
        }
    }

    /// `I` prefix: a value followed by instance variables. On strings these
    /// carry the encoding, which text decoding works out on its own.
    fn read_with_ivars(&mut self) -> Result<Value> {
        let value = self.read_value()?;
        let count = self.read_length()?;
        for _ in 0..count {
            self.read_symbol()?;
            self.read_value()?;
        }
        Ok(value)
    }

    fn read_pairs(&mut self) -> Result<Vec<(String, Value)>> {
        let count = self.read_length()?;
        let mut pairs = Vec::with_capacity(count.min(self.reader.remaining()));
        for _ in 0..count {
            let name = self.read_symbol()?;
            let value = self.read_value()?;
            pairs.push((name, value));
        }
        Ok(pairs)
    }

    fn read_symbol(&mut self) -> Result<String> {
        let position = self.reader.position();
        match self.reader.read_u8()? {
            tag::SYMBOL => self.read_symbol_body(),
            tag::SYMLINK => self.read_symlink(),
            tag::IVAR => {
                let position = self.reader.position();
                let name = match self.reader.read_u8()? {
                    tag::SYMBOL => self.read_symbol_body()?,
                    tag::SYMLINK => self.read_symlink()?,
                    tag => return Err(Error::UnknownTag { tag, position }),
                };
                let count = self.read_length()?;
                for _ in 0..count {
                    self.read_symbol()?;
                    self.read_value()?;
                }
                Ok(name)
            }
            tag => Err(Error::UnknownTag { tag, position }),
        }
    }

    fn read_symbol_body(&mut self) -> Result<String> {
        let name = decode_lossy(&self.read_byte_string()?);
        self.symbols.push(name.clone());
        Ok(name)
    }

    fn read_symlink(&mut self) -> Result<String> {
        let index = self.read_fixnum()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| self.symbols.get(i))
            .cloned()
            .ok_or(Error::BadLink { kind: "symbol", index })
    }

    fn read_link(&mut self) -> Result<Value> {
        let index = self.read_fixnum()?;
        let slot = usize::try_from(index)
            .ok()
            .filter(|&i| i < self.objects.len())
            .ok_or(Error::BadLink { kind: "object", index })?;
        match &self.objects[slot] {
            Slot::Pending => Ok(Value::Nil),
            Slot::Done(value) => Ok(value.clone()),
            // While replaying, a container that had not finished at this
            // point of the stream was still pending.
            Slot::Span { end, .. } if *end > self.reader.position() => Ok(Value::Nil),
            &Slot::Span { start, end, symbols } => {
                let position = self.reader.position();
                self.replay_budget = self.replay_budget.checked_sub(end - start).ok_or(Error::Invalid {
                    position,
                    message: "links expand past the size limit".into(),
                })?;
                self.replay(slot, start, symbols)
            }
        }
    }

    /// Read the container registered in `slot` again from its own bytes, with
    /// the symbol and link tables as they stood when it was first read.
    fn replay(&mut self, slot: usize, start: usize, symbols: usize) -> Result<Value> {
        let resume = self.reader.clone();
        let later_objects = self.objects.split_off(slot);
        let later_symbols = self.symbols.split_off(symbols);

        self.reader = BinaryReader::new(self.data);
        let value = match self.reader.skip(start) {
            Ok(()) => self.read_value(),
            Err(e) => Err(e.into()),
        };

        self.reader = resume;
        self.objects.truncate(slot);
        self.objects.extend(later_objects);
        self.symbols.truncate(symbols);
        self.symbols.extend(later_symbols);
        value
    }

    /// Marshal's variable-length integer.
    fn read_fixnum(&mut self) -> Result<i64> {
        let c = self.reader.read_i8()? as i64;
        match c {
            0 => Ok(0),
            5..=127 => Ok(c - 5),
            -128..=-5 => Ok(c + 5),
            1..=4 => {
                let mut value = 0i64;
                for i in 0..c {
                    value |= i64::from(self.reader.read_u8()?) << (8 * i);
                }
                Ok(value)
            }
            _ => {
                let count = -c;
                let mut value = -1i64;
                for i in 0..count {
                    value &= !(0xFF << (8 * i));
                    value |= i64::from(self.reader.read_u8()?) << (8 * i);
                }
                Ok(value)
            }
        }
    }

    fn read_length(&mut self) -> Result<usize> {
        let position = self.reader.position();
        let value = self.read_fixnum()?;
        usize::try_from(value).map_err(|_| Error::Invalid {
            position,
            message: format!("negative length {value}"),
        })
    }

    fn read_byte_string(&mut self) -> Result<Vec<u8>> {
        let len = self.read_length()?;
        Ok(self.reader.read_bytes(len)?.to_vec())
    }

    fn read_float(&mut self) -> Result<f64> {
        let position = self.reader.position();
        let raw = self.read_byte_string()?;
        // Ruby 1.8 appends mantissa bytes after a NUL.
        let text = raw.split(|&b| b == 0).next().unwrap_or(&[]);
        match text {
            b"nan" => Ok(f64::NAN),
            b"inf" => Ok(f64::INFINITY),
            b"-inf" => Ok(f64::NEG_INFINITY),
            _ => std::str::from_utf8(text)
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| Error::Invalid {
                    position,
                    message: format!("malformed float {:?}", String::from_utf8_lossy(text)),
                }),
        }
    }

    fn read_bignum(&mut self) -> Result<Value> {
        let negative = self.reader.read_u8()? == b'-';
        let words = self.read_length()?;
        let bytes = self.reader.read_bytes(words.saturating_mul(2))?;

        let magnitude = bytes
            .iter()
            .rev()
            .fold(0u128, |acc, &b| acc.saturating_mul(256).saturating_add(u128::from(b)));
        let signed = if negative {
            i64::try_from(magnitude).ok().map(|m| -m)
        } else {
            i64::try_from(magnitude).ok()
        };

        Ok(match signed {
            Some(v) => Value::Int(v),
            None => {
                let approx = bytes.iter().rev().fold(0f64, |acc, &b| acc * 256.0 + f64::from(b));
                Value::Float(if negative { -approx } else { approx })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::encode;

    fn parse(bytes: &[u8]) -> Value {
        let mut data = VERSION.to_vec();
        data.extend_from_slice(bytes);
        from_bytes(&data).unwrap()
    }

    #[test]
    fn test_fixnums() {
        assert_eq!(parse(b"i\x00"), Value::Int(0));
        assert_eq!(parse(b"i\x06"), Value::Int(1));
        assert_eq!(parse(b"i\x7f"), Value::Int(122));
        assert_eq!(parse(b"i\x01\x7b"), Value::Int(123));
        assert_eq!(parse(b"i\x02\xe8\x03"), Value::Int(1000));
        assert_eq!(parse(b"i\xfa"), Value::Int(-1));
        assert_eq!(parse(b"i\x80"), Value::Int(-123));
        assert_eq!(parse(b"i\xff\x84"), Value::Int(-124));
        assert_eq!(parse(b"i\xfe\x18\xfc"), Value::Int(-1000));
        assert_eq!(parse(b"i\x04\xff\xff\xff\x3f"), Value::Int(0x3FFF_FFFF));
    }

    #[test]
    fn test_floats_and_bignums() {
        assert_eq!(parse(b"f\x081.5"), Value::Float(1.5));
        assert_eq!(parse(b"f\x08inf"), Value::Float(f64::INFINITY));
        assert!(matches!(parse(b"f\x08nan"), Value::Float(v) if v.is_nan()));
        // 2**40
        assert_eq!(parse(b"l+\x08\x00\x00\x00\x00\x00\x01"), Value::Int(1 << 40));
        assert_eq!(parse(b"l-\x08\x00\x00\x00\x00\x00\x01"), Value::Int(-(1 << 40)));
    }

    #[test]
    fn test_object_with_symlinks() {
        // RPG::AudioFile twice, the second reusing symbols by link.
        let data = b"[\x07o:\x13RPG::AudioFile\x07:\x0a@nameI\"\x0aTown1\x06:\x06ET:\x0c@volumei\x5fo;\x00\x07;\x06I\"\x0aTown2\x06;\x07T;\x08i\x5f";
        let value = parse(data);
        let items = value.as_array().unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].class_name(), Some("RPG::AudioFile"));
        assert_eq!(items[1].class_name(), Some("RPG::AudioFile"));
        assert_eq!(items[0].get("name").unwrap().as_str().as_deref(), Some("Town1"));
        assert_eq!(items[1].get("@name").unwrap().as_str().as_deref(), Some("Town2"));
        assert_eq!(items[1].get("volume").unwrap().as_i64(), Some(90));
    }

    #[test]
    fn test_object_link() {
        // [s, s] where the second element links back to the string (object 1).
        let value = parse(b"[\x07\"\x08abc@\x06");
        let items = value.as_array().unwrap();
        assert_eq!(items[0], items[1]);
        assert_eq!(items[1].as_str().as_deref(), Some("abc"));
    }

    #[test]
    fn test_cyclic_link_is_nil() {
        // An array containing itself.
        let value = parse(b"[\x06@\x00");
        assert_eq!(value, Value::Array(vec![Value::Nil]));
    }

    #[test]
    fn test_hash_with_default() {
        let value = parse(b"}\x06i\x06Ti\x00");
        assert_eq!(value, Value::Hash(vec![(Value::Int(1), Value::Bool(true))]));
    }

    #[test]
    fn test_user_def_table() {
        let table = crate::Table::new(2, 1, 1, vec![5, -1]).unwrap();
        let value = Value::UserDef(UserDef {
            class: "Table".into(),
            data: table.to_bytes(),
        });
        let decoded = from_bytes(&encode(&value)).unwrap();
        assert_eq!(decoded.as_user_def().unwrap().as_table(), Some(table));
    }

    #[test]
    fn test_shift_jis_string() {
        // "ポーション" in Shift_JIS, written by Ruby 1.8 without encoding ivars.
        let value = parse(b"\"\x0f\x83\x7c\x81\x5b\x83\x56\x83\x87\x83\x93");
        assert_eq!(value.as_str().as_deref(), Some("ポーション"));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(from_bytes(b"\x04\x09["), Err(Error::Common(_))));
        assert!(matches!(
            from_bytes(b"\x04\x08*"),
            Err(Error::UnknownTag { tag: b'*', position: 2 })
        ));
        assert!(matches!(from_bytes(b"\x04\x08;\x06"), Err(Error::BadLink { kind: "symbol", .. })));
        assert!(from_bytes(b"\x04\x08[\x0a0").unwrap_err().is_truncation());
        assert!(matches!(from_bytes(b"\x04\x08[\xfa"), Err(Error::Invalid { .. })));
    }

    fn nested_arrays(levels: usize) -> Vec<u8> {
        let mut data = VERSION.to_vec();
        data.extend(std::iter::repeat(*b"[\x06").take(levels).flatten());
        data.push(b'0');
        data
    }

    #[test]
    fn test_depth_limit() {
        let deepest = from_bytes(&nested_arrays(MAX_DEPTH - 1)).unwrap();
        assert!(deepest.as_array().is_some());
        assert!(matches!(from_bytes(&nested_arrays(MAX_DEPTH)), Err(Error::DepthExceeded(_))));
        assert!(matches!(from_bytes(&nested_arrays(10_000)), Err(Error::DepthExceeded(_))));
    }

    #[test]
    fn test_ivar_symbol_chain_rejected() {
        let mut data = VERSION.to_vec();
        data.extend_from_slice(b"o");
        data.extend(std::iter::repeat(b'I').take(100_000));
        assert!(matches!(from_bytes(&data), Err(Error::UnknownTag { tag: b'I', .. })));
    }

    #[test]
    fn test_linked_container_read_again() {
        // [a, a, :sym, a] where a = ["x", :sym] and later elements link to it.
        let value = parse(b"[\x09[\x07\"\x06x:\x08sym@\x06;\x00@\x06");
        let items = value.as_array().unwrap();
        let inner = Value::Array(vec![Value::String(b"x".to_vec()), Value::Symbol("sym".into())]);
        assert_eq!(items[0], inner);
        assert_eq!(items[1], inner);
        assert_eq!(items[2], Value::Symbol("sym".into()));
        assert_eq!(items[3], inner);
    }

    /// An array of `levels` arrays where each one after the first is
    /// `[@prev, @prev]`, doubling the expanded size every step.
    fn doubling_links(levels: u8) -> Vec<u8> {
        let mut data = VERSION.to_vec();
        data.extend_from_slice(&[b'[', levels + 5]);
        data.extend_from_slice(b"[\x07i\x06i\x06");
        for slot in 1..levels {
            data.extend_from_slice(&[b'[', 2 + 5, b'@', slot + 5, b'@', slot + 5]);
        }
        data
    }

    #[test]
    fn test_link_expansion_is_bounded() {
        let small = from_bytes(&doubling_links(4)).unwrap();
        let levels = small.as_array().unwrap();
        assert_eq!(levels.len(), 4);
        assert_eq!(levels[3].as_array().unwrap()[1], levels[2]);
        assert_eq!(levels[1], Value::Array(vec![levels[0].clone(), levels[0].clone()]));

        assert!(matches!(from_bytes(&doubling_links(40)), Err(Error::Invalid { .. })));
    }

    #[test]
    fn test_link_inside_linked_container_stays_nil() {
        // a = [@a]; the outer array then links to a.
        let value = parse(b"[\x07[\x06@\x06@\x06");
        let items = value.as_array().unwrap();
        assert_eq!(items[0], Value::Array(vec![Value::Nil]));
        assert_eq!(items[1], Value::Array(vec![Value::Nil]));
    }
}
