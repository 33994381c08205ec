//! Error handling for Terra Engine
//!
//! One crate-wide error type. Subsystems keep their own narrow `thiserror`
//! enums (persistence, world) and convert into this at the public surface,
//! so library code never has to panic.

use std::error::Error as StdError;
use std::fmt;

/// Main error type for Terra Engine
#[derive(Debug)]
pub enum EngineError {
    // World Errors
    ChunkNotLoaded {
        pos: (i32, i32),
    },
    BlockOutOfBounds {
        pos: (i32, i32),
        world_height: i32,
    },
    InvalidBlockType {
        id: u16,
    },

    // Persistence Errors
    SaveFailed {
        path: String,
        error: String,
    },
    CorruptedData {
        reason: String,
    },

    // Threading Errors
    ChannelClosed {
        name: String,
    },
    TaskJoinError {
        task: String,
    },

    // Configuration Errors
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    // System Errors
    IoError {
        path: String,
        error: String,
    },
    DeserializationError {
        context: String,
        error: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ChunkNotLoaded { pos } => {
                write!(f, "Chunk not loaded at position {:?}", pos)
            }
            EngineError::BlockOutOfBounds { pos, world_height } => write!(
                f,
                "Block position {:?} out of bounds for world height {}",
                pos, world_height
            ),
            EngineError::InvalidBlockType { id } => write!(f, "Invalid block type ID: {}", id),

            EngineError::SaveFailed { path, error } => {
                write!(f, "Save failed for {}: {}", path, error)
            }
            EngineError::CorruptedData { reason } => write!(f, "Data corrupted: {}", reason),

            EngineError::ChannelClosed { name } => write!(f, "Channel closed: {}", name),
            EngineError::TaskJoinError { task } => write!(f, "Task join error: {}", task),

            EngineError::InvalidConfig {
                field,
                value,
                reason,
            } => write!(f, "Invalid config: {} = {} ({})", field, value, reason),

            EngineError::IoError { path, error } => write!(f, "IO error for {}: {}", path, error),
            EngineError::DeserializationError { context, error } => {
                write!(f, "Deserialization error in {}: {}", context, error)
            }
        }
    }
}

impl StdError for EngineError {}

/// Type alias for Results in Terra Engine
pub type EngineResult<T> = Result<T, EngineError>;

// Conversion traits for common error types

impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::IoError {
            path: String::new(),
            error: error.to_string(),
        }
    }
}

impl<T> From<crossbeam_channel::SendError<T>> for EngineError {
    fn from(_: crossbeam_channel::SendError<T>) -> Self {
        EngineError::ChannelClosed {
            name: "crossbeam".to_string(),
        }
    }
}

impl From<crossbeam_channel::RecvError> for EngineError {
    fn from(_: crossbeam_channel::RecvError) -> Self {
        EngineError::ChannelClosed {
            name: "crossbeam".to_string(),
        }
    }
}

impl From<crate::persistence::PersistenceError> for EngineError {
    fn from(err: crate::persistence::PersistenceError) -> Self {
        use crate::persistence::PersistenceError;
        match err {
            PersistenceError::SaveFailed { path, error } => EngineError::SaveFailed { path, error },
            PersistenceError::IoError { path, error } => EngineError::IoError {
                path,
                error: error.to_string(),
            },
            PersistenceError::CorruptedData(reason) => EngineError::CorruptedData { reason },
            PersistenceError::DeserializationError(e) => EngineError::DeserializationError {
                context: "persistence".to_string(),
                error: e,
            },
            PersistenceError::ChannelClosed(name) => EngineError::ChannelClosed { name },
            PersistenceError::WorkerUnavailable(task) => EngineError::TaskJoinError { task },
        }
    }
}

impl From<crate::world::error::WorldError> for EngineError {
    fn from(err: crate::world::error::WorldError) -> Self {
        use crate::world::error::WorldError;
        match err {
            WorldError::ChunkNotLoaded(pos) => EngineError::ChunkNotLoaded { pos: (pos.x, pos.y) },
            WorldError::InvalidPosition { x, y } => EngineError::BlockOutOfBounds {
                pos: (x, y),
                world_height: crate::constants::WORLD_HEIGHT,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::ChunkNotLoaded { pos: (3, -2) };
        assert_eq!(err.to_string(), "Chunk not loaded at position (3, -2)");
    }

    #[test]
    fn test_world_error_conversion() {
        let err: EngineError = crate::world::error::WorldError::InvalidPosition { x: 4, y: 300 }.into();
        assert!(matches!(
            err,
            EngineError::BlockOutOfBounds {
                pos: (4, 300),
                world_height: 256
            }
        ));
    }

    #[test]
    fn test_persistence_error_conversion() {
        let err: EngineError =
            crate::persistence::PersistenceError::CorruptedData("bad count".to_string()).into();
        assert!(matches!(err, EngineError::CorruptedData { .. }));
    }
}
