//! CRC32C fingerprints.
//!
//! Used to derive short, stable directory names from key material so that
//! cached output for different keys never collides.

/// Compute the CRC32C of a byte slice.
///
/// Uses hardware acceleration when available (SSE4.2 on x86).
#[inline]
pub fn fingerprint(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

/// The fingerprint rendered as eight lowercase hex digits.
#[inline]
pub fn fingerprint_hex(data: &[u8]) -> String {
    format!("{:08x}", fingerprint(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fingerprint() {
        assert_eq!(fingerprint(&[]), 0);
        assert_eq!(fingerprint_hex(&[]), "00000000");
    }

    #[test]
    fn test_known_value() {
        // Standard CRC32C check value.
        assert_eq!(fingerprint(b"123456789"), 0xE306_9283);
    }

    #[test]
    fn test_distinct_keys_distinct_names() {
        assert_ne!(fingerprint_hex(&[0u8; 16]), fingerprint_hex(&[1u8; 16]));
    }
}
