//! Header-based resource obfuscation.

use std::fmt;
use std::path::{Path, PathBuf};

use tsukuru_common::Error as CommonError;

use crate::{ResourceKey, Result};

/// Length of the signature block in front of every obfuscated file.
pub const SIGNATURE_LEN: usize = 16;

/// Signature written by the MV/MZ deployment tool (`RPGMV`, version 0.3.1).
pub const SIGNATURE: [u8; SIGNATURE_LEN] = [
    0x52, 0x50, 0x47, 0x4D, 0x56, 0x00, 0x00, 0x00, 0x00, 0x03, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Number of payload bytes covered by the key.
pub const XOR_LEN: usize = 16;

const SIGNATURE_PREFIX: &[u8] = b"RPGMV";
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const OGG_SIGNATURE: &[u8] = b"OggS";

/// Container type of an obfuscated asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Png,
    Ogg,
    M4a,
    /// No leading-byte check is possible.
    Unknown,
}

impl AssetKind {
    /// Kind of an obfuscated file from its extension, `None` if the
    /// extension is not one the deployment tool produces.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "rpgmvp" | "png_" => Some(Self::Png),
            "rpgmvo" | "ogg_" => Some(Self::Ogg),
            "rpgmvm" | "m4a_" => Some(Self::M4a),
            _ => None,
        }
    }

    /// Kind of an obfuscated file from its path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Extension of the original file.
    pub fn decrypted_extension(&self) -> Option<&'static str> {
        match self {
            Self::Png => Some("png"),
            Self::Ogg => Some("ogg"),
            Self::M4a => Some("m4a"),
            Self::Unknown => None,
        }
    }

    /// Whether decoded bytes start the way this container must.
    fn accepts(&self, data: &[u8]) -> bool {
        match self {
            Self::Png => data.starts_with(PNG_SIGNATURE),
            Self::Ogg => data.starts_with(OGG_SIGNATURE),
            Self::M4a => data.get(4..8) == Some(b"ftyp".as_slice()),
            Self::Unknown => true,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.decrypted_extension().unwrap_or("unknown"))
    }
}

/// Path of the original file for an obfuscated one, `None` if the path does
/// not name an obfuscated asset.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use tsukuru_crypt::decrypted_path;
///
/// assert_eq!(
///     decrypted_path(Path::new("img/faces/Actor1.rpgmvp")),
///     Some(PathBuf::from("img/faces/Actor1.png"))
/// );
/// assert_eq!(decrypted_path(Path::new("audio/bgm/Theme.ogg")), None);
/// ```
pub fn decrypted_path(path: &Path) -> Option<PathBuf> {
    let ext = AssetKind::from_path(path)?.decrypted_extension()?;
    Some(path.with_extension(ext))
}

/// XOR the leading bytes of `data` with the key.
///
/// Covers `min(16, key length, data length)` bytes and nothing else. Applying
/// it twice restores the input.
pub fn xor_head(data: &mut [u8], key: &ResourceKey) {
    for (byte, k) in data.iter_mut().zip(key.as_bytes()).take(XOR_LEN) {
        *byte ^= k;
    }
}

/// Recover the original file from an obfuscated one.
///
/// Fails with `BadMagic` if the signature block is missing, `Truncated` if
/// nothing follows it and `BadHeader` if the decoded bytes do not start like a
/// `kind` file, which almost always means the key is wrong.
pub fn decrypt(data: &[u8], key: &ResourceKey, kind: AssetKind) -> Result<Vec<u8>> {
    if !data.starts_with(SIGNATURE_PREFIX) {
        let shown = data.len().min(SIGNATURE_PREFIX.len());
        return Err(CommonError::BadMagic {
            expected: SIGNATURE_PREFIX.to_vec(),
            actual: data[..shown].to_vec(),
        }
        .into());
    }
    if data.len() <= SIGNATURE_LEN {
        return Err(CommonError::truncated(
            "obfuscated resource",
            SIGNATURE_LEN as u64 + 1,
            data.len() as u64,
        )
        .into());
    }

    let mut out = data[SIGNATURE_LEN..].to_vec();
    xor_head(&mut out, key);

    if !kind.accepts(&out) {
        return Err(CommonError::BadHeader(format!(
            "decoded bytes do not start like a {kind} file (wrong key?)"
        ))
        .into());
    }
    Ok(out)
}

/// Obfuscate a file the way the deployment tool does.
pub fn encrypt(data: &[u8], key: &ResourceKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(SIGNATURE_LEN + data.len());
    out.extend_from_slice(&SIGNATURE);
    let start = out.len();
    out.extend_from_slice(data);
    xor_head(&mut out[start..], key);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn key() -> ResourceKey {
        ResourceKey::from_hex("d41d8cd98f00b204e9800998ecf8427e").unwrap()
    }

    fn png() -> Vec<u8> {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(b"\0\0\0\rIHDR and the rest of the image body");
        data
    }

    #[test]
    fn test_decrypt_png() {
        let plain = png();
        let obfuscated = encrypt(&plain, &key());

        assert_eq!(&obfuscated[..SIGNATURE_LEN], &SIGNATURE);
        assert_ne!(&obfuscated[SIGNATURE_LEN..SIGNATURE_LEN + 16], &plain[..16]);
        assert_eq!(decrypt(&obfuscated, &key(), AssetKind::Png).unwrap(), plain);
    }

    #[test]
    fn test_only_leading_bytes_transformed() {
        let plain = png();
        let obfuscated = encrypt(&plain, &key());
        assert_eq!(&obfuscated[SIGNATURE_LEN + 16..], &plain[16..]);
    }

    #[test]
    fn test_head_transform_is_self_inverse() {
        let obfuscated = encrypt(&png(), &key());
        let mut decoded = decrypt(&obfuscated, &key(), AssetKind::Png).unwrap();
        xor_head(&mut decoded, &key());
        assert_eq!(&decoded[..], &obfuscated[SIGNATURE_LEN..]);
    }

    #[test]
    fn test_wrong_key_is_bad_header() {
        let obfuscated = encrypt(&png(), &key());
        let wrong = ResourceKey::from_hex("00000000000000000000000000000001").unwrap();
        let err = decrypt(&obfuscated, &wrong, AssetKind::Png).unwrap_err();
        assert!(matches!(err, Error::Common(CommonError::BadHeader(_))));
    }

    #[test]
    fn test_ogg_and_m4a_checks() {
        let ogg = b"OggS\0\x02 audio payload".to_vec();
        assert_eq!(decrypt(&encrypt(&ogg, &key()), &key(), AssetKind::Ogg).unwrap(), ogg);

        let m4a = b"\0\0\0\x20ftypM4A \0\0\0\0".to_vec();
        assert_eq!(decrypt(&encrypt(&m4a, &key()), &key(), AssetKind::M4a).unwrap(), m4a);
        assert!(decrypt(&encrypt(&m4a, &key()), &key(), AssetKind::Ogg).is_err());
    }

    #[test]
    fn test_missing_signature() {
        let err = decrypt(&png(), &key(), AssetKind::Png).unwrap_err();
        assert!(matches!(err, Error::Common(CommonError::BadMagic { .. })));
    }

    #[test]
    fn test_signature_only_is_truncated() {
        let err = decrypt(&SIGNATURE, &key(), AssetKind::Unknown).unwrap_err();
        assert!(matches!(err, Error::Common(ref e) if e.is_truncation()));
    }

    #[test]
    fn test_short_payload_and_short_key() {
        let short_key = ResourceKey::from_hex("ffff").unwrap();
        let obfuscated = encrypt(b"abc", &short_key);
        assert_eq!(&obfuscated[SIGNATURE_LEN + 2..], b"c");
        assert_eq!(decrypt(&obfuscated, &short_key, AssetKind::Unknown).unwrap(), b"abc");
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(AssetKind::from_extension("RPGMVP"), Some(AssetKind::Png));
        assert_eq!(AssetKind::from_extension("ogg_"), Some(AssetKind::Ogg));
        assert_eq!(AssetKind::from_extension("rpgmvm"), Some(AssetKind::M4a));
        assert_eq!(AssetKind::from_extension("png"), None);
        assert_eq!(
            decrypted_path(Path::new("audio/se/Cursor1.m4a_")),
            Some(PathBuf::from("audio/se/Cursor1.m4a"))
        );
    }
}
