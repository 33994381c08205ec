//! Octave-noise terrain generator
//!
//! Column heights come from five cyclic octave tables derived once from the
//! world seed. Tables wrap every `width` blocks, which makes the terrain
//! seamless and infinite without unbounded state.

use super::{features, FeatureEdit, WorldGenerator};
use crate::constants::{CHUNK_SIZE, SEA_LEVEL, WORLD_HEIGHT};
use crate::world::core::{Block, BlockSource, ChunkPos};
use crate::error::{EngineError, EngineResult};
use crate::world::storage::Chunk;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of noise octaves
pub const OCTAVES: usize = 5;

/// Terrain shape parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainParams {
    /// Height the octaves are summed onto
    pub base_height: f64,
    /// Water fills empty cells up to and including this logical Y
    pub sea_level: i32,
    /// Horizontal period of the octave tables, in blocks
    pub width: f64,
    /// Control points per octave, coarse to fine
    pub segments: [usize; OCTAVES],
    pub amplitudes: [f64; OCTAVES],
    /// Lowest allowed surface height
    pub min_height: i32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            base_height: 55.0,
            sea_level: SEA_LEVEL,
            width: 1024.0,
            segments: [5, 8, 16, 32, 64],
            amplitudes: [
                256.0 * 0.04,
                256.0 * 0.03,
                256.0 * 0.02,
                256.0 * 0.01,
                256.0 * 0.005,
            ],
            min_height: 4,
        }
    }
}

impl TerrainParams {
    /// Reject shapes that would break height sampling
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |field: &str, value: String, reason: &str| EngineError::InvalidConfig {
            field: field.to_string(),
            value,
            reason: reason.to_string(),
        };

        if let Some(o) = self.segments.iter().position(|&segs| segs == 0) {
            return Err(invalid(
                "segments",
                format!("{:?}", self.segments),
                &format!("octave {} needs at least one segment", o),
            ));
        }
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(invalid("width", self.width.to_string(), "must be positive"));
        }
        if !self.base_height.is_finite() || self.amplitudes.iter().any(|a| !a.is_finite()) {
            return Err(invalid(
                "amplitudes",
                format!("{:?}", self.amplitudes),
                "heights must be finite",
            ));
        }
        if !(0..WORLD_HEIGHT).contains(&self.min_height) {
            return Err(invalid(
                "min_height",
                self.min_height.to_string(),
                "must lie inside the world",
            ));
        }
        Ok(())
    }
}

/// Seed-derived octave control points. Octave `o` holds `segments[o] + 1` values.
#[derive(Debug, Clone, PartialEq)]
pub struct OctaveTables {
    values: Vec<Vec<f64>>,
}

impl OctaveTables {
    pub fn new(seed: i64, params: &TerrainParams) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
        let values = params
            .segments
            .iter()
            .map(|&segs| {
                (0..=segs)
                    .map(|_| {
                        let r: f64 = rng.gen();
                        // Skew toward the extremes for more pronounced hills
                        r.powf(0.6) * 2.0 - 1.0
                    })
                    .collect()
            })
            .collect();
        Self { values }
    }

    pub fn octave(&self, o: usize) -> &[f64] {
        &self.values[o]
    }
}

/// Default world generator: layered terrain plus a shoreline pass
pub struct TerrainGenerator {
    seed: i64,
    params: TerrainParams,
    tables: OctaveTables,
}

impl TerrainGenerator {
    pub fn new(seed: i64) -> Self {
        Self::build(seed, TerrainParams::default())
    }

    /// Generator with custom terrain shape
    pub fn with_params(seed: i64, params: TerrainParams) -> EngineResult<Self> {
        params.validate()?;
        Ok(Self::build(seed, params))
    }

    fn build(seed: i64, params: TerrainParams) -> Self {
        let tables = OctaveTables::new(seed, &params);
        log::debug!(
            "[TerrainGenerator::new] Built octave tables for seed {} ({:?} segments)",
            seed,
            params.segments
        );
        Self {
            seed,
            params,
            tables,
        }
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Unclamped, unrounded noise height of a global column
    fn raw_height(&self, world_x: i32) -> f64 {
        let mut h = self.params.base_height;
        for (o, &segs) in self.params.segments.iter().enumerate() {
            let segs_f = segs as f64;
            let pos = (world_x as f64 / self.params.width) * segs_f;
            // rem_euclid keeps the position in [0, segs) for negative X
            let pos = pos.rem_euclid(segs_f);
            let i0 = (pos.floor() as usize).min(segs - 1);
            let i1 = if i0 + 1 >= segs { 0 } else { i0 + 1 };
            let t = pos - i0 as f64;
            let tt = t * t * (3.0 - 2.0 * t);

            let table = self.tables.octave(o);
            let v = table[i0] + (table[i1] - table[i0]) * tt;
            h += v * self.params.amplitudes[o];
        }
        h
    }

    /// Fill one column of `chunk` given its surface height
    fn fill_column(&self, chunk: &mut Chunk, local_x: i32, surface: i32) {
        let (_, origin_y) = chunk.pos().origin();
        let stone_max = surface - 4;

        for local_y in 0..CHUNK_SIZE {
            let world_y = origin_y + local_y;
            let block = if world_y == surface {
                Some(Block::GRASS)
            } else if world_y <= stone_max {
                Some(Block::STONE)
            } else if world_y < surface && world_y >= 0 {
                // The three layers between stone and the grass cap
                Some(Block::DIRT)
            } else if world_y <= self.params.sea_level {
                Some(Block::WATER)
            } else {
                None
            };
            chunk.set_generated(local_x, local_y, block);
        }
    }
}

impl WorldGenerator for TerrainGenerator {
    fn seed(&self) -> i64 {
        self.seed
    }

    fn generate_chunk(&self, pos: ChunkPos) -> Chunk {
        let mut chunk = Chunk::new(pos);
        let (origin_x, _) = pos.origin();
        for local_x in 0..CHUNK_SIZE {
            let surface = self.surface_height(origin_x + local_x);
            self.fill_column(&mut chunk, local_x, surface);
        }
        chunk
    }

    fn plan_features(&self, pos: ChunkPos, world: &dyn BlockSource) -> Vec<FeatureEdit> {
        features::plan_shoreline(pos, world)
    }

    fn surface_height(&self, world_x: i32) -> i32 {
        let h = self
            .raw_height(world_x)
            .clamp(self.params.min_height as f64, (WORLD_HEIGHT - 1) as f64);
        h.round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let a = TerrainGenerator::new(42);
        let b = TerrainGenerator::new(42);
        for pos in [ChunkPos::new(0, 3), ChunkPos::new(-7, 4), ChunkPos::new(12, 2)] {
            assert_eq!(a.generate_chunk(pos), b.generate_chunk(pos));
        }
    }

    #[test]
    fn test_seed_changes_terrain() {
        let a = TerrainGenerator::new(42);
        let b = TerrainGenerator::new(43);
        let differs = (-512..512).any(|x| a.surface_height(x) != b.surface_height(x));
        assert!(differs);
    }

    #[test]
    fn test_surface_height_in_range() {
        let generator = TerrainGenerator::new(7);
        for x in -2048..2048 {
            let h = generator.surface_height(x);
            assert!((4..WORLD_HEIGHT).contains(&h), "x={} h={}", x, h);
        }
    }

    #[test]
    fn test_terrain_wraps_with_period() {
        let generator = TerrainGenerator::new(99);
        for x in [-300, 0, 17, 511] {
            assert_eq!(generator.surface_height(x), generator.surface_height(x + 1024));
        }
    }

    #[test]
    fn test_column_layers() {
        let generator = TerrainGenerator::new(42);
        let x = 5;
        let surface = generator.surface_height(x);
        let chunk_pos = ChunkPos::from_block(x, surface);
        let chunk = generator.generate_chunk(chunk_pos);
        let (cx, cy) = chunk_pos.origin();
        let local = |wy: i32| wy - cy;

        assert_eq!(chunk.get(x - cx, local(surface)), Some(Block::GRASS));
        // The dirt layers may fall into the chunk below
        for depth in 1..=3 {
            let ly = local(surface - depth);
            if ly >= 0 {
                assert_eq!(chunk.get(x - cx, ly), Some(Block::DIRT));
            }
        }
        let above = local(surface + 1);
        if above < CHUNK_SIZE {
            let expected = if surface + 1 <= SEA_LEVEL {
                Some(Block::WATER)
            } else {
                None
            };
            assert_eq!(chunk.get(x - cx, above), expected);
        }
    }

    #[test]
    fn test_params_validation() {
        assert!(TerrainParams::default().validate().is_ok());

        let mut params = TerrainParams::default();
        params.segments[1] = 0;
        let err = TerrainGenerator::with_params(42, params).err().expect("zero segments");
        assert!(err.to_string().contains("segments"));

        for params in [
            TerrainParams {
                width: 0.0,
                ..Default::default()
            },
            TerrainParams {
                min_height: WORLD_HEIGHT,
                ..Default::default()
            },
            TerrainParams {
                amplitudes: [f64::NAN; OCTAVES],
                ..Default::default()
            },
        ] {
            assert!(TerrainGenerator::with_params(42, params).is_err());
        }
    }

    #[test]
    fn test_custom_params_flat_world() {
        let params = TerrainParams {
            segments: [1; OCTAVES],
            amplitudes: [0.0; OCTAVES],
            ..Default::default()
        };
        let generator = TerrainGenerator::with_params(3, params).expect("valid params");
        for x in [-40, 0, 999] {
            assert_eq!(generator.surface_height(x), 55);
        }
    }

    #[test]
    fn test_sky_and_floor_chunks() {
        let generator = TerrainGenerator::new(42);
        assert!(generator.generate_chunk(ChunkPos::new(0, 15)).is_empty());
        let floor = generator.generate_chunk(ChunkPos::new(0, 0));
        assert!(floor.blocks().iter().all(|b| *b == Some(Block::STONE)));
        assert!(!floor.needs_saving());
    }
}
