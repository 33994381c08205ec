//! In-memory chunk storage

mod chunk;

pub use chunk::Chunk;
