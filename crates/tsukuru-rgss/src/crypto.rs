//! RGSSAD key stream.
//!
//! Both the directory metadata and the entry payloads are XORed with a 32-bit
//! linear congruential key (`key * 7 + 3`, wrapping). The directory stream
//! starts from [`SEED`]; each payload starts from the key recorded for its entry.

/// Initial key of the sequential directory stream.
pub const SEED: u32 = 0xDEAD_CAFE;

/// A running RGSSAD key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStream(u32);

impl KeyStream {
    #[inline]
    pub const fn new(key: u32) -> Self {
        Self(key)
    }

    /// The current key value.
    #[inline]
    pub const fn key(&self) -> u32 {
        self.0
    }

    /// Step to the next key.
    #[inline]
    pub fn advance(&mut self) {
        self.0 = self.0.wrapping_mul(7).wrapping_add(3);
    }

    /// Step `count` keys forward.
    pub fn advance_by(&mut self, count: u64) {
        for _ in 0..count {
            self.advance();
        }
    }

    /// Decode one directory integer and advance.
    #[inline]
    pub fn decode_u32(&mut self, raw: u32) -> u32 {
        let value = raw ^ self.0;
        self.advance();
        value
    }

    /// Decode one sequential-directory name byte and advance.
    #[inline]
    pub fn decode_name_byte(&mut self, raw: u8) -> u8 {
        let value = raw ^ (self.0 & 0xFF) as u8;
        self.advance();
        value
    }
}

/// XOR a payload window in place.
///
/// `phase` is the byte position of `data[0]` inside its 4-byte key group; the
/// stream must already be at that group's key. The transform is its own inverse.
pub(crate) fn apply_payload_keystream(data: &mut [u8], stream: &mut KeyStream, phase: usize) {
    let mut lane = phase % 4;
    for byte in data.iter_mut() {
        *byte ^= stream.key().to_le_bytes()[lane];
        lane += 1;
        if lane == 4 {
            lane = 0;
            stream.advance();
        }
    }
}

/// Decode a whole entry payload encoded with `key`.
///
/// Each 4-byte group is XORed with the little-endian bytes of the current key,
/// then the key advances. A trailing partial group uses the leading key bytes.
pub fn decrypt_payload(data: &[u8], key: u32) -> Vec<u8> {
    let mut out = data.to_vec();
    apply_payload_keystream(&mut out, &mut KeyStream::new(key), 0);
    out
}

/// Key of the seeded (version 3) directory for a given header seed.
#[inline]
pub(crate) fn seeded_directory_key(seed: u32) -> u32 {
    seed.wrapping_mul(9).wrapping_add(3)
}
