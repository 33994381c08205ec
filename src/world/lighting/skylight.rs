//! Skylight propagation
//!
//! Breadth-first relaxation from sky-exposed cells. A cell only ever takes
//! the highest level proposed to it, and is re-enqueued only when it
//! improves, so BFS order yields the true maximum over all paths.

use super::{BlockGrid, LightGrid};
use crate::constants::lighting::MAX_LIGHT;
use std::collections::VecDeque;

/// Skylight calculator - stateless, takes a grid and returns levels
pub struct SkylightCalculator;

impl SkylightCalculator {
    /// Compute skylight for every cell of `grid`
    pub fn compute<G: BlockGrid + ?Sized>(grid: &G) -> LightGrid {
        let width = grid.width();
        let height = grid.height();
        let mut light = LightGrid::new(width, height);
        let mut queue = VecDeque::new();

        Self::seed_columns(grid, &mut light, &mut queue);
        Self::propagate(grid, &mut light, &mut queue);

        light
    }

    /// Seed every column from the top down to and including its first obstruction
    fn seed_columns<G: BlockGrid + ?Sized>(
        grid: &G,
        light: &mut LightGrid,
        queue: &mut VecDeque<(usize, usize)>,
    ) {
        for x in 0..grid.width() {
            for y in (0..grid.height()).rev() {
                light.set_skylight(x, y, MAX_LIGHT);
                queue.push_back((x, y));
                if grid.block(x, y).is_some() {
                    break;
                }
            }
        }
    }

    fn propagate<G: BlockGrid + ?Sized>(
        grid: &G,
        light: &mut LightGrid,
        queue: &mut VecDeque<(usize, usize)>,
    ) {
        let width = grid.width();
        let height = grid.height();

        while let Some((x, y)) = queue.pop_front() {
            let level = light.skylight(x, y);
            if level <= 1 {
                continue;
            }
            let proposed = level - 1;

            let neighbors = [
                (x.checked_sub(1), Some(y)),
                ((x + 1 < width).then_some(x + 1), Some(y)),
                (Some(x), y.checked_sub(1)),
                (Some(x), (y + 1 < height).then_some(y + 1)),
            ];
            for (nx, ny) in neighbors {
                let (Some(nx), Some(ny)) = (nx, ny) else {
                    continue;
                };
                if proposed <= light.skylight(nx, ny) {
                    continue;
                }
                light.set_skylight(nx, ny, proposed);
                // Solid cells take the light but do not pass it on
                if grid.passable(nx, ny) {
                    queue.push_back((nx, ny));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::core::Block;

    struct TestGrid {
        width: usize,
        height: usize,
        cells: Vec<Option<Block>>,
    }

    impl TestGrid {
        fn empty(width: usize, height: usize) -> Self {
            Self {
                width,
                height,
                cells: vec![None; width * height],
            }
        }

        fn put(&mut self, x: usize, y: usize, block: Block) {
            self.cells[y * self.width + x] = Some(block);
        }
    }

    impl BlockGrid for TestGrid {
        fn width(&self) -> usize {
            self.width
        }
        fn height(&self) -> usize {
            self.height
        }
        fn block(&self, x: usize, y: usize) -> Option<Block> {
            self.cells[y * self.width + x]
        }
    }

    #[test]
    fn test_empty_column_fully_lit() {
        let grid = TestGrid::empty(1, 64);
        let light = SkylightCalculator::compute(&grid);
        for y in 0..64 {
            assert_eq!(light.skylight(0, y), 15);
            assert_eq!(light.blocklight(0, y), 0);
        }
    }

    #[test]
    fn test_platform_shadow_decreases_to_zero() {
        let width = 5;
        let height = 40;
        let platform_y = 30;
        let mut grid = TestGrid::empty(width, height);
        for x in 0..width {
            grid.put(x, platform_y, Block::STONE);
        }
        let light = SkylightCalculator::compute(&grid);

        // The platform itself is the first obstruction and is seeded
        assert_eq!(light.skylight(2, platform_y), 15);
        let mut previous = 15;
        for depth in 1..=15 {
            let level = light.skylight(2, platform_y - depth);
            assert!(level < previous, "depth {} level {}", depth, level);
            previous = level;
        }
        assert_eq!(light.skylight(2, platform_y - 15), 0);
        assert_eq!(light.skylight(2, 0), 0);
    }

    #[test]
    fn test_light_spreads_sideways_under_overhang() {
        let mut grid = TestGrid::empty(6, 10);
        // Two-thick overhang covering x 1..6, open sky at x 0
        for x in 1..6 {
            grid.put(x, 5, Block::STONE);
            grid.put(x, 6, Block::STONE);
        }
        let light = SkylightCalculator::compute(&grid);
        assert_eq!(light.skylight(0, 4), 15);
        assert_eq!(light.skylight(1, 4), 14);
        assert_eq!(light.skylight(3, 4), 12);
        assert_eq!(light.skylight(5, 4), 10);
        // Lower overhang row is lit from the seeded row above but does not pass it on
        assert_eq!(light.skylight(3, 5), 14);
    }

    #[test]
    fn test_water_decrements_like_air() {
        let mut grid = TestGrid::empty(3, 20);
        for x in 0..3 {
            grid.put(x, 19, Block::WATER);
            grid.put(x, 18, Block::WATER);
        }
        for x in 0..3 {
            grid.put(x, 17, Block::STONE);
        }
        // Only the top water row is seeded, the stone row stays dark below
        let light = SkylightCalculator::compute(&grid);
        assert_eq!(light.skylight(1, 19), 15);
        assert_eq!(light.skylight(1, 18), 14);
        assert_eq!(light.skylight(1, 17), 13);
        assert_eq!(light.skylight(1, 16), 0);
    }

    #[test]
    fn test_effective_light_uses_max() {
        let mut light = LightGrid::new(1, 1);
        light.set_skylight(0, 0, 3);
        light.set_blocklight(0, 0, 9);
        assert_eq!(light.effective(0, 0), 9);
    }
}
