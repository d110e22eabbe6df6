//! Little-endian cursor over a borrowed byte slice.
//!
//! Shared by the RGSS directory walker and the Marshal reader. Every read
//! either succeeds completely or leaves the cursor where it was.

use zerocopy::FromBytes;

use crate::{Error, Result};

/// Forward-only cursor over `&[u8]`.
///
/// ```
/// use tsukuru_common::BinaryReader;
///
/// let mut reader = BinaryReader::new(b"\x04\x08[\x00");
/// reader.expect_magic(&[4, 8]).unwrap();
/// assert_eq!(reader.read_u8().unwrap(), b'[');
/// assert_eq!(reader.remaining(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Offset of the next unread byte.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        let end = self
            .position
            .checked_add(count)
            .filter(|_| count <= available)
            .ok_or(Error::UnexpectedEof { needed: count, available })?;
        let taken = &self.data[self.position..end];
        self.position = end;
        Ok(taken)
    }

    #[inline]
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(drop)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.array::<1>().map(|[b]| b)
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.array().map(i8::from_le_bytes)
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        self.array().map(i16::from_le_bytes)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.array().map(u32::from_le_bytes)
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.array().map(i32::from_le_bytes)
    }

    /// Copy out a fixed-layout record.
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Consume `expected` or fail with [`Error::BadMagic`].
    ///
    /// Input shorter than the signature is bad magic, not truncation.
    pub fn expect_magic(&mut self, expected: &[u8]) -> Result<()> {
        let rest = &self.data[self.position.min(self.data.len())..];
        if !rest.starts_with(expected) {
            return Err(Error::BadMagic {
                expected: expected.to_vec(),
                actual: rest[..rest.len().min(expected.len())].to_vec(),
            });
        }
        self.position += expected.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_reads() {
        let mut reader = BinaryReader::new(&[0x78, 0x56, 0x34, 0x12, 0xfe, 0xff, 0x80, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(reader.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(reader.read_i16().unwrap(), -2);
        assert_eq!(reader.read_i8().unwrap(), -128);
        assert_eq!(reader.read_i32().unwrap(), -1);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_signature_mismatch_and_short_input() {
        let mut archive = BinaryReader::new(b"RGSSAD\0\x03");
        archive.expect_magic(b"RGSSAD\0").unwrap();
        assert_eq!(archive.read_u8().unwrap(), 3);

        let mut short = BinaryReader::new(b"RG");
        assert!(matches!(short.expect_magic(b"RGSSAD"), Err(Error::BadMagic { .. })));
        assert_eq!(short.position(), 0);
    }

    #[test]
    fn test_overrun_leaves_cursor_in_place() {
        let mut reader = BinaryReader::new(&[1, 2, 3]);
        reader.read_u8().unwrap();
        let err = reader.read_u32().unwrap_err();
        assert!(err.is_truncation());
        assert_eq!(reader.position(), 1);
        assert!(reader.skip(usize::MAX).is_err());
        reader.skip(2).unwrap();
        assert!(reader.is_empty());
    }
}
