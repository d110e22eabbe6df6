//! RGSS `Table`: the 1-3 dimensional `i16` array behind map tiles,
//! tileset flags and class parameter curves.

use tsukuru_common::BinaryReader;

use crate::{Error, Result};

/// Decoded `Table` contents, x-fastest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    xsize: usize,
    ysize: usize,
    zsize: usize,
    data: Vec<i16>,
}

impl Table {
    /// Decode `_dump` output: five `i32` (dimensions, x, y, z, element count)
    /// followed by the elements.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(bytes);
        let _dimensions = reader.read_i32()?;
        let xsize = dimension(reader.read_i32()?, &reader)?;
        let ysize = dimension(reader.read_i32()?, &reader)?;
        let zsize = dimension(reader.read_i32()?, &reader)?;
        let count = dimension(reader.read_i32()?, &reader)?;

        if xsize.checked_mul(ysize).and_then(|v| v.checked_mul(zsize)) != Some(count) {
            return Err(Error::Invalid {
                position: reader.position(),
                message: format!("table {xsize}x{ysize}x{zsize} declares {count} elements"),
            });
        }
        if reader.remaining() < count.saturating_mul(2) {
            let declared = (count as u64).saturating_mul(2);
            return Err(tsukuru_common::Error::truncated("table", declared, reader.remaining() as u64).into());
        }

        let mut data = Vec::with_capacity(count);
        for _ in 0..count {
            data.push(reader.read_i16()?);
        }

        Ok(Self {
            xsize,
            ysize,
            zsize,
            data,
        })
    }

    pub fn new(xsize: usize, ysize: usize, zsize: usize, data: Vec<i16>) -> Option<Self> {
        let count = xsize.checked_mul(ysize).and_then(|v| v.checked_mul(zsize));
        (count == Some(data.len())).then_some(Self {
            xsize,
            ysize,
            zsize,
            data,
        })
    }

    #[inline]
    pub fn xsize(&self) -> usize {
        self.xsize
    }

    #[inline]
    pub fn ysize(&self) -> usize {
        self.ysize
    }

    #[inline]
    pub fn zsize(&self) -> usize {
        self.zsize
    }

    #[inline]
    pub fn data(&self) -> &[i16] {
        &self.data
    }

    pub fn into_data(self) -> Vec<i16> {
        self.data
    }

    /// Element at (x, y, z), `None` when out of range.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<i16> {
        if x >= self.xsize || y >= self.ysize || z >= self.zsize {
            return None;
        }
        self.data
            .get((z * self.ysize + y) * self.xsize + x)
            .copied()
    }

    /// Encode in `_dump` layout.
    #[cfg(any(test, feature = "test-util"))]
    pub fn to_bytes(&self) -> Vec<u8> {
        let dimensions = if self.zsize > 1 {
            3
        } else if self.ysize > 1 {
            2
        } else {
            1
        };
        let mut out = Vec::with_capacity(20 + self.data.len() * 2);
        for field in [dimensions, self.xsize, self.ysize, self.zsize, self.data.len()] {
            out.extend_from_slice(&(field as i32).to_le_bytes());
        }
        for value in &self.data {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }
}

fn dimension(value: i32, reader: &BinaryReader<'_>) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::Invalid {
        position: reader.position(),
        message: format!("negative table size {value}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_indexing() {
        let table = Table::new(3, 2, 2, (0..12).collect()).unwrap();
        let decoded = Table::from_bytes(&table.to_bytes()).unwrap();

        assert_eq!(decoded, table);
        assert_eq!(decoded.get(2, 1, 1), Some(11));
        assert_eq!(decoded.get(1, 0, 1), Some(7));
        assert_eq!(decoded.get(3, 0, 0), None);
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let mut bytes = Table::new(2, 2, 1, vec![0; 4]).unwrap().to_bytes();
        bytes[16..20].copy_from_slice(&5i32.to_le_bytes());
        assert!(matches!(Table::from_bytes(&bytes), Err(Error::Invalid { .. })));
    }

    #[test]
    fn test_short_data_is_truncation() {
        let bytes = Table::new(4, 1, 1, vec![1, 2, 3, 4]).unwrap().to_bytes();
        let err = Table::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(err.is_truncation());
    }
}
