//! Project resource keys.

use std::fmt;

use thiserror::Error;
use tsukuru_common::hash::fingerprint_hex;
use tsukuru_common::text::strip_utf8_bom;

/// Why a project has no usable resource key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("System.json has no encryptionKey")]
    Missing,

    #[error("encryptionKey is empty")]
    Empty,

    #[error("encryptionKey has odd length {0}")]
    OddLength(usize),

    #[error("encryptionKey is not valid hex: {0}")]
    InvalidHex(String),

    #[error("System.json could not be read: {0}")]
    Unreadable(String),
}

/// Raw key bytes decoded from the project's hex string.
///
/// Only the first 16 bytes take part in decryption.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey(Vec<u8>);

impl ResourceKey {
    /// Decode a hex key. Case and surrounding whitespace are ignored.
    ///
    /// ```
    /// use tsukuru_crypt::{KeyError, ResourceKey};
    ///
    /// let key = ResourceKey::from_hex("D41D8CD98F00B204E9800998ECF8427E").unwrap();
    /// assert_eq!(key.as_bytes()[0], 0xd4);
    /// assert_eq!(ResourceKey::from_hex("abc"), Err(KeyError::OddLength(3)));
    /// ```
    pub fn from_hex(text: &str) -> Result<Self, KeyError> {
        let text = text.trim().to_ascii_lowercase();
        if text.is_empty() {
            return Err(KeyError::Empty);
        }
        if text.len() % 2 != 0 {
            return Err(KeyError::OddLength(text.len()));
        }
        hex::decode(&text)
            .map(Self)
            .map_err(|e| KeyError::InvalidHex(e.to_string()))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex form, as stored in System.json.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Short stable identifier, safe to use as a directory name.
    pub fn fingerprint(&self) -> String {
        fingerprint_hex(&self.0)
    }
}

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey({})", self.fingerprint())
    }
}

/// Whether a project can decrypt its resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyState {
    Available(ResourceKey),
    Unavailable(KeyError),
}

impl KeyState {
    /// Key state from an optional hex string.
    pub fn from_hex(text: Option<&str>) -> Self {
        match text.map(ResourceKey::from_hex) {
            Some(Ok(key)) => Self::Available(key),
            Some(Err(e)) => Self::Unavailable(e),
            None => Self::Unavailable(KeyError::Missing),
        }
    }

    /// Read `encryptionKey` from System.json contents.
    pub fn from_system_json(bytes: &[u8]) -> Self {
        let value: serde_json::Value = match serde_json::from_slice(strip_utf8_bom(bytes)) {
            Ok(value) => value,
            Err(e) => return Self::Unavailable(KeyError::Unreadable(e.to_string())),
        };
        Self::from_hex(value.get("encryptionKey").and_then(|v| v.as_str()))
    }

    pub fn key(&self) -> Option<&ResourceKey> {
        match self {
            Self::Available(key) => Some(key),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_normalizes() {
        let upper = ResourceKey::from_hex(" 0A1B2C3D ").unwrap();
        assert_eq!(upper.as_bytes(), &[0x0a, 0x1b, 0x2c, 0x3d]);
        assert_eq!(upper.to_hex(), "0a1b2c3d");
    }

    #[test]
    fn test_from_hex_errors() {
        assert_eq!(ResourceKey::from_hex(""), Err(KeyError::Empty));
        assert_eq!(ResourceKey::from_hex("   "), Err(KeyError::Empty));
        assert_eq!(ResourceKey::from_hex("123"), Err(KeyError::OddLength(3)));
        assert!(matches!(ResourceKey::from_hex("zz"), Err(KeyError::InvalidHex(_))));
    }

    #[test]
    fn test_system_json_key() {
        let json = br#"{"gameTitle":"Demo","encryptionKey":"d41d8cd98f00b204e9800998ecf8427e"}"#;
        let state = KeyState::from_system_json(json);
        assert!(state.is_available());
        assert_eq!(state.key().unwrap().len(), 16);
    }

    #[test]
    fn test_system_json_with_bom() {
        let mut json = b"\xEF\xBB\xBF".to_vec();
        json.extend_from_slice(br#"{"encryptionKey":"d41d8cd98f00b204e9800998ecf8427e"}"#);
        let state = KeyState::from_system_json(&json);
        assert_eq!(state.key().map(ResourceKey::to_hex).as_deref(), Some("d41d8cd98f00b204e9800998ecf8427e"));
    }

    #[test]
    fn test_system_json_without_key() {
        assert_eq!(
            KeyState::from_system_json(br#"{"gameTitle":"Demo"}"#),
            KeyState::Unavailable(KeyError::Missing)
        );
        assert!(matches!(
            KeyState::from_system_json(b"not json"),
            KeyState::Unavailable(KeyError::Unreadable(_))
        ));
    }

    #[test]
    fn test_debug_hides_key_material() {
        let key = ResourceKey::from_hex("00112233445566778899aabbccddeeff").unwrap();
        let shown = format!("{key:?}");
        assert!(!shown.contains("00112233"));
        assert!(shown.starts_with("ResourceKey("));
    }
}
