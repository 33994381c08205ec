//! Chunk Serializer Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in chunk_serializer_operations.rs

use crate::world::core::ChunkPos;

/// One `<count>*<token>` segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RleRun {
    pub count: usize,
    pub token: String,
}

/// Encoded copy of a chunk handed to the I/O worker
///
/// Taken on the game thread so the worker never reads a live chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSnapshot {
    pub pos: ChunkPos,
    /// Chunk revision at snapshot time
    pub revision: u64,
    pub body: Vec<u8>,
}
