//! World management
//!
//! Chunk residency, streaming around a focus point and spawn selection.

mod chunk_manager;
mod spawn_finder;
mod world_manager;

pub use chunk_manager::{ChunkManager, ChunkStats};
pub use spawn_finder::SpawnFinder;
pub use world_manager::{WorldManager, WorldManagerConfig};
