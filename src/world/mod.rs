//! World Module
//!
//! - **Core**: blocks, the block registry and coordinate spaces
//! - **Storage**: fixed-size chunks
//! - **Generation**: deterministic terrain plus the neighbour-aware feature pass
//! - **Lighting**: skylight flood fill
//! - **Management**: residency, streaming and spawn selection

pub mod core;
pub mod error;
pub mod generation;
pub mod lighting;
pub mod management;
pub mod storage;

pub use core::{
    Block, BlockId, BlockPos, BlockProperties, BlockRegistry, BlockSource, ChunkPos, LocalPos,
    SharedBlockRegistry,
};
pub use error::WorldError;
pub use generation::{FeatureEdit, TerrainGenerator, TerrainParams, WorldGenerator};
pub use lighting::{BlockGrid, LightGrid, SkylightCalculator};
pub use management::{ChunkManager, ChunkStats, SpawnFinder, WorldManager, WorldManagerConfig};
pub use storage::Chunk;
