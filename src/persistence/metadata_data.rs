//! Metadata Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in metadata_operations.rs

use glam::DVec2;

/// World-level records stored next to the chunks
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldMetadata {
    /// Seed the archive was written with
    pub seed: Option<i64>,
    /// Last saved player position, screen tile space
    pub player: Option<DVec2>,
}
