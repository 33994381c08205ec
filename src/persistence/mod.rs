//! Persistence Module
//!
//! One gzip-compressed tar archive per world holds the metadata records
//! (seed, player position) and one run-length encoded record per saved
//! chunk. All file access happens on the `chunk-io-thread` worker owned by
//! [`ChunkIoManager`].

// Data modules
pub mod chunk_serializer_data;
pub mod metadata_data;
pub mod world_save_data;

// Operations modules
pub mod chunk_serializer_operations;
pub mod metadata_operations;
pub mod world_save_operations;

pub mod chunk_io;

pub use chunk_io::{ChunkIoManager, ChunkLoadResult, SaveOutcome};
pub use chunk_serializer_data::{ChunkSnapshot, RleRun};
pub use metadata_data::WorldMetadata;
pub use world_save_data::{ArchiveEntries, WorldSaveRequest};

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Save failed for {path}: {error}")]
    SaveFailed { path: String, error: String },
    #[error("IO error for {path}: {error}")]
    IoError {
        path: String,
        #[source]
        error: std::io::Error,
    },
    #[error("Corrupted data: {0}")]
    CorruptedData(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Channel closed: {0}")]
    ChannelClosed(String),
    #[error("Worker unavailable: {0}")]
    WorkerUnavailable(String),
}

impl PersistenceError {
    pub(crate) fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> PersistenceError + '_ {
        move |error| PersistenceError::IoError {
            path: path.display().to_string(),
            error,
        }
    }
}
