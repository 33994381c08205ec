//! World Save Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in world_save_operations.rs

use super::chunk_serializer_data::ChunkSnapshot;
use glam::DVec2;
use std::collections::BTreeMap;

/// Archive contents split by entry kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveEntries {
    /// Everything outside `chunks/`
    pub metadata: BTreeMap<String, Vec<u8>>,
    /// Chunk records keyed by entry name
    pub chunks: BTreeMap<String, Vec<u8>>,
}

/// Which entries to keep while reading an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveReadMode {
    Full,
    MetadataOnly,
}

/// Blocking full-world save
#[derive(Debug, Clone)]
pub struct WorldSaveRequest {
    pub seed: i64,
    pub player: Option<DVec2>,
    pub chunks: Vec<ChunkSnapshot>,
}
