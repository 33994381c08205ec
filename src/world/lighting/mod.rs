//! Lighting
//!
//! Skylight is computed over a rectangular block grid. Blocklight is a
//! second channel reserved for emitters and is currently always zero.

mod skylight;

pub use skylight::SkylightCalculator;

use crate::world::core::{is_passable, Block};

/// A rectangular block region addressed with `y` counting upward
pub trait BlockGrid {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn block(&self, x: usize, y: usize) -> Option<Block>;

    /// Whether light continues through this cell
    fn passable(&self, x: usize, y: usize) -> bool {
        is_passable(self.block(x, y))
    }
}

/// Per-cell light levels, 0-15, row-major like chunk storage
#[derive(Debug, Clone, PartialEq)]
pub struct LightGrid {
    width: usize,
    height: usize,
    skylight: Vec<u8>,
    blocklight: Vec<u8>,
}

impl LightGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            skylight: vec![0; width * height],
            blocklight: vec![0; width * height],
        }
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn skylight(&self, x: usize, y: usize) -> u8 {
        self.skylight[self.index(x, y)]
    }

    pub fn set_skylight(&mut self, x: usize, y: usize, level: u8) {
        let i = self.index(x, y);
        self.skylight[i] = level;
    }

    pub fn blocklight(&self, x: usize, y: usize) -> u8 {
        self.blocklight[self.index(x, y)]
    }

    pub fn set_blocklight(&mut self, x: usize, y: usize, level: u8) {
        let i = self.index(x, y);
        self.blocklight[i] = level;
    }

    /// Light actually seen at a cell
    pub fn effective(&self, x: usize, y: usize) -> u8 {
        self.skylight(x, y).max(self.blocklight(x, y))
    }

    /// Bounds-checked effective light
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        (x < self.width && y < self.height).then(|| self.effective(x, y))
    }
}
