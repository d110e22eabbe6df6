//! Four-direction passability per map cell, from tileset flags.

use serde::Serialize;
use tsukuru_data::model::{MapRecord, Tileset};

/// Direction bits in the low nibble of a tile flag; set means blocked.
pub const DOWN: u8 = 0x1;
pub const LEFT: u8 = 0x2;
pub const RIGHT: u8 = 0x4;
pub const UP: u8 = 0x8;

const DIRECTIONS: [u8; 4] = [DOWN, LEFT, RIGHT, UP];
/// Star tiles draw above characters and leave passage to the layer below.
const STAR: i32 = 0x10;
/// Only the four tile layers take part; shadows and regions do not.
const TILE_LAYERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Passability {
    pub width: i32,
    pub height: i32,
    /// Passable direction bits per cell, row-major.
    pub cells: Vec<u8>,
}

impl Passability {
    /// Compute the grid. Without a tileset every cell is impassable.
    pub fn compute(map: &MapRecord, tileset: Option<&Tileset>) -> Self {
        let width = map.width.max(0);
        let height = map.height.max(0);
        let layers = map.layers().min(TILE_LAYERS);
        let mut cells = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                let cell = tileset.map_or(0, |tileset| cell_bits(map, tileset, x, y, layers));
                cells.push(cell);
            }
        }
        Self { width, height, cells }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get((y * self.width + x) as usize).copied()
    }

    pub fn is_passable(&self, x: i32, y: i32, direction: u8) -> bool {
        self.get(x, y).is_some_and(|bits| bits & direction != 0)
    }

    /// Whether the cell can be left in at least one direction.
    pub fn is_open(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(|bits| bits != 0)
    }
}

fn cell_bits(map: &MapRecord, tileset: &Tileset, x: i32, y: i32, layers: usize) -> u8 {
    let mut bits = 0;
    for direction in DIRECTIONS {
        let passable = (0..layers).rev().find_map(|layer| {
            let tile = map.tile(x, y, layer)?;
            let flag = *tileset.flags.get(usize::try_from(tile).ok().filter(|&t| t > 0)?)?;
            if flag & STAR != 0 {
                return None;
            }
            Some(flag & i32::from(direction) == 0)
        });
        if passable == Some(true) {
            bits |= direction;
        }
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(data: Vec<i32>) -> MapRecord {
        MapRecord {
            width: 2,
            height: 1,
            data,
            ..Default::default()
        }
    }

    fn tileset() -> Tileset {
        let mut flags = vec![0; 8];
        flags[1] = 0x0; // floor
        flags[2] = 0xf; // wall
        flags[3] = 0x10; // star
        flags[4] = 0x8; // blocked upward only
        Tileset {
            id: 1,
            flags,
            ..Default::default()
        }
    }

    #[test]
    fn test_top_layer_decides() {
        // Layer 0: floor, floor. Layer 1: wall on the right cell.
        let grid = Passability::compute(&map(vec![1, 1, 0, 2]), Some(&tileset()));
        assert_eq!(grid.get(0, 0), Some(0xf));
        assert_eq!(grid.get(1, 0), Some(0));
        assert!(!grid.is_passable(1, 0, LEFT));
        assert!(grid.is_open(0, 0));
        assert!(!grid.is_open(1, 0));
    }

    #[test]
    fn test_star_defers_to_lower_layer() {
        let grid = Passability::compute(&map(vec![2, 4, 3, 3]), Some(&tileset()));
        assert_eq!(grid.get(0, 0), Some(0));
        assert_eq!(grid.get(1, 0), Some(DOWN | LEFT | RIGHT));
        assert!(!grid.is_passable(1, 0, UP));
    }

    #[test]
    fn test_without_tileset_nothing_passes() {
        let grid = Passability::compute(&map(vec![1, 1]), None);
        assert_eq!(grid.cells, vec![0, 0]);
        assert_eq!(grid.get(2, 0), None);
    }
}
