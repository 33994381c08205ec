//! Tile, chunk and screen coordinate spaces
//!
//! Storage uses logical Y (up from the world floor). Input and rendering use
//! screen tile Y (down from the top). Global coordinates decompose into
//! `(chunk, local)` with floor division so negative tiles resolve correctly.

use crate::constants::{CHUNK_SIZE, VERTICAL_CHUNKS, WORLD_HEIGHT};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Floor division: rounds toward negative infinity.
#[inline]
pub fn floor_div(a: i32, b: i32) -> i32 {
    let q = a / b;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Floor modulo: the result takes the sign of the divisor.
#[inline]
pub fn floor_mod(a: i32, b: i32) -> i32 {
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

/// Split a global tile coordinate into `(chunk, local)`.
#[inline]
pub fn tile_to_chunk(coord: i32) -> (i32, i32) {
    (floor_div(coord, CHUNK_SIZE), floor_mod(coord, CHUNK_SIZE))
}

/// Screen tile Y (down) to logical block Y (up)
#[inline]
pub fn screen_to_logical_y(screen_y: i32) -> i32 {
    (WORLD_HEIGHT - 1) - screen_y
}

/// Logical block Y (up) to screen tile Y (down)
#[inline]
pub fn logical_to_screen_y(logical_y: i32) -> i32 {
    (WORLD_HEIGHT - 1) - logical_y
}

/// Chunk coordinate. Row `y` counts upward in logical space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk owning the given global block coordinate (logical Y)
    pub fn from_block(x: i32, logical_y: i32) -> Self {
        Self::new(floor_div(x, CHUNK_SIZE), floor_div(logical_y, CHUNK_SIZE))
    }

    /// Global block coordinate of this chunk's local origin
    pub fn origin(&self) -> (i32, i32) {
        (self.x * CHUNK_SIZE, self.y * CHUNK_SIZE)
    }

    /// Whether this chunk row lies inside the world's vertical extent
    pub fn in_world(&self) -> bool {
        self.y >= 0 && self.y < VERTICAL_CHUNKS
    }

    /// The 8 surrounding chunk coordinates
    pub fn neighbors(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        (-1..=1).flat_map(move |dy| {
            (-1..=1)
                .filter(move |&dx| dx != 0 || dy != 0)
                .map(move |dx| ChunkPos::new(self.x + dx, self.y + dy))
        })
    }

    /// Chebyshev distance in chunks
    pub fn chebyshev_distance(&self, other: ChunkPos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.x, self.y)
    }
}

/// Global block coordinate with logical Y
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert a screen tile (Y down) into a logical block position
    pub fn from_tile(tile_x: i32, tile_y: i32) -> Self {
        Self::new(tile_x, screen_to_logical_y(tile_y))
    }

    pub fn to_tile(&self) -> (i32, i32) {
        (self.x, logical_to_screen_y(self.y))
    }

    /// Decompose into owning chunk and local coordinates
    pub fn split(&self) -> (ChunkPos, LocalPos) {
        let (cx, lx) = tile_to_chunk(self.x);
        let (cy, ly) = tile_to_chunk(self.y);
        (ChunkPos::new(cx, cy), LocalPos::new(lx, ly))
    }

    pub fn in_world(&self) -> bool {
        self.y >= 0 && self.y < WORLD_HEIGHT
    }
}

/// Coordinate inside a chunk, `[0, CHUNK_SIZE)` on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: i32,
    pub y: i32,
}

impl LocalPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
