//! Metadata Operations - Pure DOP Functions
//!
//! `meta.dat` holds the seed as a big-endian i64, `player.dat` the player
//! position as two big-endian f64.

use super::metadata_data::WorldMetadata;
use super::{PersistenceError, PersistenceResult};
use crate::constants::persistence::{META_ENTRY, PLAYER_ENTRY};
use glam::DVec2;
use std::collections::BTreeMap;

pub fn encode_seed(seed: i64) -> Vec<u8> {
    seed.to_be_bytes().to_vec()
}

pub fn decode_seed(data: &[u8]) -> PersistenceResult<i64> {
    let bytes: [u8; 8] = data
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| {
            PersistenceError::CorruptedData(format!("seed record has {} bytes", data.len()))
        })?;
    Ok(i64::from_be_bytes(bytes))
}

pub fn encode_player(position: DVec2) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    out.extend_from_slice(&position.x.to_be_bytes());
    out.extend_from_slice(&position.y.to_be_bytes());
    out
}

pub fn decode_player(data: &[u8]) -> PersistenceResult<DVec2> {
    let read = |offset: usize| -> Option<f64> {
        let bytes: [u8; 8] = data.get(offset..offset + 8)?.try_into().ok()?;
        Some(f64::from_be_bytes(bytes))
    };
    match (read(0), read(8)) {
        (Some(x), Some(y)) => Ok(DVec2::new(x, y)),
        _ => Err(PersistenceError::CorruptedData(format!(
            "player record has {} bytes",
            data.len()
        ))),
    }
}

/// Write the metadata records into an entry set
pub fn store_metadata(
    entries: &mut BTreeMap<String, Vec<u8>>,
    seed: i64,
    player: Option<DVec2>,
) {
    if let Some(position) = player {
        entries.insert(PLAYER_ENTRY.to_string(), encode_player(position));
    }
    entries.insert(META_ENTRY.to_string(), encode_seed(seed));
}

/// Read the metadata records. Unreadable records are logged and skipped.
pub fn read_metadata(entries: &BTreeMap<String, Vec<u8>>) -> WorldMetadata {
    let seed = entries.get(META_ENTRY).and_then(|data| {
        decode_seed(data)
            .map_err(|e| log::warn!("[metadata::read_metadata] Unreadable seed: {}", e))
            .ok()
    });
    let player = entries.get(PLAYER_ENTRY).and_then(|data| {
        decode_player(data)
            .map_err(|e| log::warn!("[metadata::read_metadata] Unreadable player position: {}", e))
            .ok()
    });
    WorldMetadata { seed, player }
}
