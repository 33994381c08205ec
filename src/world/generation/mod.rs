//! World generation
//!
//! Terrain is a pure function of `(seed, chunk)`. Features that depend on
//! neighbouring chunks run as a second pass: they are planned against a
//! read-only view of the world and applied afterwards, so one pass never
//! observes its own edits.

pub mod features;
pub mod terrain;

use crate::world::core::{Block, BlockSource, ChunkPos};
use crate::world::storage::Chunk;

pub use terrain::{OctaveTables, TerrainGenerator, TerrainParams, OCTAVES};

/// One planned feature-pass write, in the target chunk's local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureEdit {
    pub local_x: i32,
    pub local_y: i32,
    pub block: Option<Block>,
}

/// World generator interface
pub trait WorldGenerator: Send + Sync {
    /// Seed this generator was built for
    fn seed(&self) -> i64;

    /// Generate the terrain of a chunk. Must be deterministic.
    fn generate_chunk(&self, pos: ChunkPos) -> Chunk;

    /// Plan the feature pass for a chunk whose neighbours are resident
    fn plan_features(&self, pos: ChunkPos, world: &dyn BlockSource) -> Vec<FeatureEdit>;

    /// Surface height (logical Y of the top block) of a global column
    fn surface_height(&self, world_x: i32) -> i32;
}

/// Apply planned edits without dirtying the chunk
pub fn apply_features(chunk: &mut Chunk, edits: &[FeatureEdit]) {
    for edit in edits {
        chunk.set_generated(edit.local_x, edit.local_y, edit.block);
    }
    chunk.mark_features_generated();
}
