//! World-wide constants shared by generation, storage and streaming.

/// Edge length of a square chunk, in blocks
pub const CHUNK_SIZE: i32 = 16;

/// Number of cells stored per chunk
pub const CHUNK_VOLUME: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

/// World height in blocks. Logical Y runs `0..WORLD_HEIGHT` from the floor up.
pub const WORLD_HEIGHT: i32 = 256;

/// Number of chunk rows stacked vertically
pub const VERTICAL_CHUNKS: i32 = (WORLD_HEIGHT + CHUNK_SIZE - 1) / CHUNK_SIZE;

/// Highest logical Y filled with water by the terrain pass
pub const SEA_LEVEL: i32 = 63;

pub mod lighting {
    /// Skylight level of open sky
    pub const MAX_LIGHT: u8 = 15;
}

pub mod streaming {
    /// Default chunk radius kept resident around the focus
    pub const DEFAULT_LOAD_RADIUS: i32 = 3;

    /// Default chunk radius searched by the safe-spawn scan
    pub const DEFAULT_SPAWN_SEARCH_RADIUS: i32 = 10;
}

pub mod persistence {
    /// Archive file name inside the save directory
    pub const ARCHIVE_FILE_NAME: &str = "world.wgz";
    pub const META_ENTRY: &str = "meta.dat";
    pub const PLAYER_ENTRY: &str = "player.dat";
    /// Prefix shared by every chunk record in the archive
    pub const CHUNK_ENTRY_PREFIX: &str = "chunks/";
    /// Token written for empty cells
    pub const AIR_TOKEN: &str = "air";
    /// Name of the background I/O thread
    pub const IO_THREAD_NAME: &str = "chunk-io-thread";
}
