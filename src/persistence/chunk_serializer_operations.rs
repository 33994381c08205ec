//! Chunk Serializer Operations - Pure DOP Functions
//!
//! Row-major run-length encoding of chunk cells:
//! `<count>*<token>` segments separated by `\n`, `air` for empty cells.

use super::chunk_serializer_data::{ChunkSnapshot, RleRun};
use super::{PersistenceError, PersistenceResult};
use crate::constants::persistence::{AIR_TOKEN, CHUNK_ENTRY_PREFIX};
use crate::constants::CHUNK_VOLUME;
use crate::world::core::{Block, BlockRegistry, ChunkPos};
use crate::world::storage::Chunk;

/// Archive entry name of a chunk record
pub fn entry_name(pos: ChunkPos) -> String {
    format!("{}chunk_{}_{}.dat", CHUNK_ENTRY_PREFIX, pos.x, pos.y)
}

fn token_of(cell: Option<Block>, registry: &BlockRegistry) -> &str {
    match cell {
        None => AIR_TOKEN,
        Some(block) => registry.get_name(block.id).unwrap_or_else(|| {
            log::warn!(
                "[chunk_serializer::encode_chunk] Block id {} has no registered name",
                block.id.0
            );
            "unknown"
        }),
    }
}

/// Collapse chunk cells into runs, in row-major order
pub fn chunk_runs(chunk: &Chunk, registry: &BlockRegistry) -> Vec<RleRun> {
    let mut runs: Vec<RleRun> = Vec::new();
    for cell in chunk.blocks() {
        let token = token_of(*cell, registry);
        match runs.last_mut() {
            Some(run) if run.token == token => run.count += 1,
            _ => runs.push(RleRun {
                count: 1,
                token: token.to_string(),
            }),
        }
    }
    runs
}

/// Encode a chunk into its archive body
pub fn encode_chunk(chunk: &Chunk, registry: &BlockRegistry) -> String {
    chunk_runs(chunk, registry)
        .iter()
        .map(|run| format!("{}*{}", run.count, run.token))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Snapshot a chunk for an asynchronous save
pub fn snapshot_chunk(chunk: &Chunk, registry: &BlockRegistry) -> ChunkSnapshot {
    ChunkSnapshot {
        pos: chunk.pos(),
        revision: chunk.revision(),
        body: encode_chunk(chunk, registry).into_bytes(),
    }
}

/// Parse one segment. Blank segments yield `Ok(None)`.
pub fn parse_run(segment: &str) -> PersistenceResult<Option<RleRun>> {
    let run = segment.trim();
    if run.is_empty() {
        return Ok(None);
    }

    let separator = run
        .find('*')
        .ok_or_else(|| PersistenceError::CorruptedData(format!("missing '*' in run '{}'", run)))?;
    if separator == 0 || separator == run.len() - 1 {
        return Err(PersistenceError::CorruptedData(format!(
            "invalid run format '{}'",
            run
        )));
    }

    let count: i64 = run[..separator].parse().map_err(|_| {
        PersistenceError::CorruptedData(format!("invalid run length in '{}'", run))
    })?;
    if count <= 0 {
        return Err(PersistenceError::CorruptedData(format!(
            "non-positive run length in '{}'",
            run
        )));
    }

    Ok(Some(RleRun {
        count: count as usize,
        token: run[separator + 1..].to_string(),
    }))
}

/// Decode an archive body into a chunk. Fails on any malformed or short input.
///
/// Block names missing from `registry` are registered so they survive the
/// next save.
pub fn decode_chunk(
    pos: ChunkPos,
    body: &[u8],
    registry: &mut BlockRegistry,
) -> PersistenceResult<Chunk> {
    let text = std::str::from_utf8(body)
        .map_err(|e| PersistenceError::DeserializationError(format!("chunk {}: {}", pos, e)))?;
    if text.trim().is_empty() {
        return Err(PersistenceError::CorruptedData(format!(
            "empty record for chunk {}",
            pos
        )));
    }

    let mut cells: Vec<Option<Block>> = Vec::with_capacity(CHUNK_VOLUME);
    for segment in text.split('\n') {
        let Some(run) = parse_run(segment)? else {
            continue;
        };
        if cells.len() + run.count > CHUNK_VOLUME {
            return Err(PersistenceError::CorruptedData(format!(
                "chunk {} holds more than {} cells",
                pos, CHUNK_VOLUME
            )));
        }
        let cell = if run.token == AIR_TOKEN {
            None
        } else {
            Some(registry.resolve_or_register(&run.token))
        };
        cells.extend(std::iter::repeat(cell).take(run.count));
    }

    let decoded = cells.len();
    Chunk::from_blocks(pos, cells).ok_or_else(|| {
        PersistenceError::CorruptedData(format!(
            "incomplete chunk {}: expected {} cells, got {}",
            pos, CHUNK_VOLUME, decoded
        ))
    })
}
