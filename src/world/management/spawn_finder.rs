//! Safe spawn search
//!
//! Candidate columns are visited chunk by chunk outward from the preferred
//! column, right side before left. A column qualifies when its topmost
//! non-water block is not capped by water.

use crate::constants::{CHUNK_SIZE, WORLD_HEIGHT};
use crate::world::core::BlockSource;

pub struct SpawnFinder {
    /// Search radius in chunks
    search_radius: i32,
}

impl SpawnFinder {
    pub fn new(search_radius: i32) -> Self {
        Self {
            search_radius: search_radius.max(1),
        }
    }

    /// Columns in visiting order: `x..x+16`, then `x-16..x`, then `x+16..x+32`, ...
    pub fn candidate_columns(&self, preferred_x: i32) -> impl Iterator<Item = i32> {
        (0..self.search_radius).flat_map(move |offset| {
            let right = preferred_x + offset * CHUNK_SIZE;
            let left = preferred_x - offset * CHUNK_SIZE;
            let sides: &'static [i32] = if offset == 0 { &[1] } else { &[1, -1] };
            sides.iter().flat_map(move |&side| {
                let base = if side > 0 { right } else { left };
                base..base + CHUNK_SIZE
            })
        })
    }

    /// Logical Y of the ground in column `x`, or `None` if the column is
    /// submerged or has no ground at all
    pub fn scan_column(world: &dyn BlockSource, x: i32) -> Option<i32> {
        for y in (0..WORLD_HEIGHT).rev() {
            let Some(block) = world.block_at(x, y) else {
                continue;
            };
            if block.is_water() {
                continue;
            }
            let submerged = world.block_at(x, y + 1).map_or(false, |b| b.is_water());
            return if submerged { None } else { Some(y) };
        }
        None
    }
}

impl Default for SpawnFinder {
    fn default() -> Self {
        Self::new(crate::constants::streaming::DEFAULT_SPAWN_SEARCH_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::core::Block;

    struct Columns;

    impl BlockSource for Columns {
        fn block_at(&self, x: i32, y: i32) -> Option<Block> {
            match (x, y) {
                (_, y) if y <= 60 => Some(Block::STONE),
                (0, 61..=63) => Some(Block::WATER),
                _ => None,
            }
        }
    }

    #[test]
    fn test_candidate_order() {
        let finder = SpawnFinder::new(2);
        let columns: Vec<i32> = finder.candidate_columns(100).collect();
        assert_eq!(columns.len(), 48);
        assert_eq!(&columns[..3], &[100, 101, 102]);
        assert_eq!(columns[16], 116);
        assert_eq!(columns[32], 84);
    }

    #[test]
    fn test_submerged_column_rejected() {
        assert_eq!(SpawnFinder::scan_column(&Columns, 0), None);
        assert_eq!(SpawnFinder::scan_column(&Columns, 1), Some(60));
    }
}
