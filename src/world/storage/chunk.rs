//! Chunk storage
//!
//! A `CHUNK_SIZE × CHUNK_SIZE` grid of optional blocks, row-major with
//! `index = y * CHUNK_SIZE + x` and local `y` counting upward.

use crate::constants::{CHUNK_SIZE, CHUNK_VOLUME};
use crate::world::core::{Block, ChunkPos};

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pos: ChunkPos,
    blocks: Vec<Option<Block>>,
    /// Unsaved mutations since the last successful save
    dirty: bool,
    features_generated: bool,
    /// Bumped on every dirtying mutation, used to acknowledge async saves
    revision: u64,
}

impl Chunk {
    /// Create an empty (all air) chunk
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            blocks: vec![None; CHUNK_VOLUME],
            dirty: false,
            features_generated: false,
            revision: 0,
        }
    }

    /// Rebuild a chunk from decoded cells. Returns `None` on a size mismatch.
    pub fn from_blocks(pos: ChunkPos, blocks: Vec<Option<Block>>) -> Option<Self> {
        if blocks.len() != CHUNK_VOLUME {
            return None;
        }
        Some(Self {
            pos,
            blocks,
            dirty: false,
            features_generated: false,
            revision: 0,
        })
    }

    #[inline]
    fn index(x: i32, y: i32) -> Option<usize> {
        if (0..CHUNK_SIZE).contains(&x) && (0..CHUNK_SIZE).contains(&y) {
            Some((y * CHUNK_SIZE + x) as usize)
        } else {
            None
        }
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// Block at local coordinates. Out of range reads as empty.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Block> {
        Self::index(x, y).and_then(|i| self.blocks[i])
    }

    /// Gameplay edit: marks the chunk dirty. Out of range is ignored.
    pub fn set(&mut self, x: i32, y: i32, block: Option<Block>) {
        if let Some(i) = Self::index(x, y) {
            self.blocks[i] = block;
            self.mark_dirty();
        }
    }

    /// Generation/deserialization write: does not mark dirty
    pub fn set_generated(&mut self, x: i32, y: i32, block: Option<Block>) {
        if let Some(i) = Self::index(x, y) {
            self.blocks[i] = block;
        }
    }

    pub fn blocks(&self) -> &[Option<Block>] {
        &self.blocks
    }

    pub fn needs_saving(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn needs_features(&self) -> bool {
        !self.features_generated
    }

    pub fn mark_features_generated(&mut self) {
        self.features_generated = true;
    }

    /// Whether every cell is empty
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Option::is_none)
    }
}
