//! Text decoding for project strings.
//!
//! Japanese projects built with the legacy tools frequently store names and
//! dialogue as Shift_JIS. Strings are tried as UTF-8 first, then Shift_JIS,
//! and only then decoded lossily.

use std::borrow::Cow;

use encoding_rs::SHIFT_JIS;

/// Which decoding succeeded for a byte string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TextEncoding {
    Utf8,
    ShiftJis,
    /// Neither decoding was clean; invalid sequences were replaced.
    Lossy,
}

/// Decode a byte string, reporting which encoding was used.
///
/// ```
/// use tsukuru_common::text::{decode_text, TextEncoding};
///
/// let (text, encoding) = decode_text(b"\x83\x7c\x81\x5b\x83\x56\x83\x87\x83\x93");
/// assert_eq!(text, "ポーション");
/// assert_eq!(encoding, TextEncoding::ShiftJis);
/// ```
pub fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, TextEncoding) {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (Cow::Borrowed(text), TextEncoding::Utf8);
    }

    if let Some(text) = SHIFT_JIS.decode_without_bom_handling_and_without_replacement(bytes) {
        return (text, TextEncoding::ShiftJis);
    }

    (String::from_utf8_lossy(bytes), TextEncoding::Lossy)
}

/// Drop a leading UTF-8 byte order mark. Some exporters write one in front
/// of JSON data files.
#[inline]
pub fn strip_utf8_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

/// Decode a byte string into an owned `String`.
#[inline]
pub fn decode_lossy(bytes: &[u8]) -> String {
    decode_text(bytes).0.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_utf8_bom() {
        assert_eq!(strip_utf8_bom(b"\xEF\xBB\xBF{}"), b"{}");
        assert_eq!(strip_utf8_bom(b"{}"), b"{}");
        assert_eq!(strip_utf8_bom(b"\xEF\xBB"), b"\xEF\xBB");
    }

    #[test]
    fn test_utf8_passthrough() {
        let (text, encoding) = decode_text("勇者".as_bytes());
        assert_eq!(text, "勇者");
        assert_eq!(encoding, TextEncoding::Utf8);
        assert!(matches!(text, Cow::Borrowed(_)));
    }

    #[test]
    fn test_shift_jis_fallback() {
        let (encoded, _, _) = SHIFT_JIS.encode("村人");
        let (text, encoding) = decode_text(&encoded);
        assert_eq!(text, "村人");
        assert_eq!(encoding, TextEncoding::ShiftJis);
    }

    #[test]
    fn test_lossy_last_resort() {
        // 0xFF is invalid in both UTF-8 and Shift_JIS.
        let (text, encoding) = decode_text(&[b'a', 0xFF, 0xFF, b'b']);
        assert_eq!(encoding, TextEncoding::Lossy);
        assert!(text.starts_with('a'));
        assert!(text.ends_with('b'));
    }
}
