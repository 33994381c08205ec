/// World Error Handling
///
/// Error types for tile-addressed world operations. Converted into
/// [`crate::error::EngineError`] at the crate surface.
use crate::world::core::ChunkPos;

#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("Chunk not loaded: {0}")]
    ChunkNotLoaded(ChunkPos),

    #[error("Invalid position: ({x}, {y})")]
    InvalidPosition { x: i32, y: i32 },
}
