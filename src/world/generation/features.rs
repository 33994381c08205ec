//! Second-pass features that need neighbouring chunks

use super::FeatureEdit;
use crate::constants::CHUNK_SIZE;
use crate::world::core::{Block, BlockId, BlockSource, ChunkPos};

/// Plan shoreline sand for one chunk
///
/// Every dirt or grass block with water anywhere in its 8-neighbourhood turns
/// to sand. Reads go through `world` so neighbours in other chunks count.
pub fn plan_shoreline(pos: ChunkPos, world: &dyn BlockSource) -> Vec<FeatureEdit> {
    let (origin_x, origin_y) = pos.origin();
    let mut edits = Vec::new();

    for local_y in 0..CHUNK_SIZE {
        for local_x in 0..CHUNK_SIZE {
            let wx = origin_x + local_x;
            let wy = origin_y + local_y;

            let convertible = matches!(
                world.block_at(wx, wy),
                Some(block) if block.id == BlockId::DIRT || block.id == BlockId::GRASS
            );
            if convertible && near_water(world, wx, wy) {
                edits.push(FeatureEdit {
                    local_x,
                    local_y,
                    block: Some(Block::SAND),
                });
            }
        }
    }

    edits
}

fn near_water(world: &dyn BlockSource, x: i32, y: i32) -> bool {
    (-1..=1).any(|dy| {
        (-1..=1).any(|dx| {
            (dx != 0 || dy != 0)
                && world
                    .block_at(x + dx, y + dy)
                    .map_or(false, |b| b.is_water())
        })
    })
}
