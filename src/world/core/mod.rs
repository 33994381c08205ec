//! Core world data types and fundamental structures
//!
//! Blocks, the block registry and the coordinate spaces everything else is
//! addressed in.

mod block;
mod position;
mod registry;

pub use block::{is_passable, Block, BlockId, BlockProperties, BUILTIN_BLOCKS};
pub use position::{
    floor_div, floor_mod, logical_to_screen_y, screen_to_logical_y, tile_to_chunk, BlockPos,
    ChunkPos, LocalPos,
};
pub use registry::BlockRegistry;

/// Shared handle to the block registry. Read by the I/O worker when decoding.
pub type SharedBlockRegistry = std::sync::Arc<parking_lot::RwLock<BlockRegistry>>;

/// Read-only access to blocks by global logical coordinate
///
/// Implemented by anything that can answer block queries across chunk
/// borders. Cells outside loaded data read as empty.
pub trait BlockSource {
    fn block_at(&self, x: i32, logical_y: i32) -> Option<Block>;
}
