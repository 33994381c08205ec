//! World Manager
//!
//! Tile-addressed block access, the per-tick streaming driver, the feature
//! pass scheduler, the skylight cache and the safe-spawn search, on top of
//! [`ChunkManager`].
//!
//! Tile coordinates passed in and out use screen space (Y down). Everything
//! below this layer uses logical Y (up).

use super::chunk_manager::{ChunkManager, ChunkStats};
use super::spawn_finder::SpawnFinder;
use crate::constants::streaming::{DEFAULT_LOAD_RADIUS, DEFAULT_SPAWN_SEARCH_RADIUS};
use crate::constants::{CHUNK_SIZE, VERTICAL_CHUNKS, WORLD_HEIGHT};
use crate::error::{EngineError, EngineResult};
use crate::persistence::ChunkIoManager;
use crate::world::core::{
    floor_div, logical_to_screen_y, screen_to_logical_y, Block, BlockPos, BlockRegistry,
    BlockSource, ChunkPos, SharedBlockRegistry,
};
use crate::world::error::WorldError;
use crate::world::generation::{apply_features, FeatureEdit, TerrainGenerator, WorldGenerator};
use crate::world::lighting::{BlockGrid, LightGrid, SkylightCalculator};
use crate::world::storage::Chunk;
use glam::{DVec2, IVec2};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// World manager configuration
#[derive(Clone, Debug)]
pub struct WorldManagerConfig {
    pub seed: i64,
    /// Directory holding the world archive
    pub save_dir: PathBuf,
    /// Chunks within this Chebyshev radius of the focus are kept resident
    pub load_radius: i32,
    /// Dirty chunks beyond this radius are saved
    pub autosave_radius: i32,
    /// Chunks beyond this radius are evicted
    pub unload_radius: i32,
    /// Chunks searched on each side by the safe-spawn scan
    pub spawn_search_radius: i32,
}

impl Default for WorldManagerConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            save_dir: PathBuf::from("."),
            load_radius: DEFAULT_LOAD_RADIUS,
            autosave_radius: DEFAULT_LOAD_RADIUS,
            unload_radius: DEFAULT_LOAD_RADIUS + 1,
            spawn_search_radius: DEFAULT_SPAWN_SEARCH_RADIUS,
        }
    }
}

/// Column strip of the world the light cache covers
struct LightRegion<'a> {
    source: &'a ChunkManager,
    origin_x: i32,
    width: usize,
}

impl BlockGrid for LightRegion<'_> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        WORLD_HEIGHT as usize
    }

    fn block(&self, x: usize, y: usize) -> Option<Block> {
        self.source.block_at(self.origin_x + x as i32, y as i32)
    }
}

#[derive(Default)]
struct LightCache {
    origin_x: i32,
    grid: Option<LightGrid>,
}

impl LightCache {
    fn invalidate(&mut self) {
        self.grid = None;
    }
}

pub struct WorldManager {
    config: WorldManagerConfig,
    registry: SharedBlockRegistry,
    chunks: ChunkManager,
    /// Focus chunk of the last streaming pass
    last_center: Option<ChunkPos>,
    light: LightCache,
}

impl WorldManager {
    /// Open a world with the default terrain generator and block set
    pub fn new(config: WorldManagerConfig) -> EngineResult<Self> {
        let generator = Arc::new(TerrainGenerator::new(config.seed));
        let registry = Arc::new(RwLock::new(BlockRegistry::new()));
        Self::with_generator(config, generator, registry)
    }

    pub fn with_generator(
        config: WorldManagerConfig,
        generator: Arc<dyn WorldGenerator>,
        registry: SharedBlockRegistry,
    ) -> EngineResult<Self> {
        if generator.seed() != config.seed {
            log::warn!(
                "[WorldManager::new] Generator seed {} differs from configured seed {}",
                generator.seed(),
                config.seed
            );
        }
        let io = ChunkIoManager::new(&config.save_dir, registry.clone())?;
        let chunks = ChunkManager::new(generator, registry.clone(), io);
        log::info!(
            "[WorldManager::new] World with seed {} (load radius {}, unload radius {})",
            config.seed,
            config.load_radius,
            config.unload_radius
        );
        Ok(Self {
            config,
            registry,
            chunks,
            last_center: None,
            light: LightCache::default(),
        })
    }

    pub fn seed(&self) -> i64 {
        self.config.seed
    }

    pub fn config(&self) -> &WorldManagerConfig {
        &self.config
    }

    pub fn registry(&self) -> &SharedBlockRegistry {
        &self.registry
    }

    pub fn stats(&self) -> ChunkStats {
        self.chunks.get_stats()
    }

    /// Read archive metadata. Returns the saved player position, if any.
    ///
    /// A stored seed different from the configured one is only reported;
    /// the configured seed keeps generating new terrain.
    pub fn load_world(&self) -> Option<DVec2> {
        match self.chunks.load_metadata() {
            Ok(meta) => {
                if let Some(stored) = meta.seed {
                    if stored != self.config.seed {
                        log::warn!(
                            "[WorldManager::load_world] Saved seed {} differs from configured seed {}",
                            stored,
                            self.config.seed
                        );
                    }
                }
                meta.player
            }
            Err(e) => {
                log::error!("[WorldManager::load_world] Could not read world metadata: {}", e);
                None
            }
        }
    }

    // Block access

    /// Block at a logical position
    pub fn get_block(&self, x: i32, logical_y: i32) -> Option<Block> {
        self.chunks.block_at(x, logical_y)
    }

    /// Block at a screen tile
    pub fn get_block_at_tile(&self, x: i32, tile_y: i32) -> Option<Block> {
        self.get_block(x, screen_to_logical_y(tile_y))
    }

    /// Write a block at a screen tile. Does nothing if the chunk is not resident.
    pub fn set_block_at_tile(&mut self, x: i32, tile_y: i32, block: Option<Block>) {
        let _ = self.try_set_block_at_tile(x, tile_y, block);
    }

    /// Write a block at a screen tile, reporting why it could not be written
    pub fn try_set_block_at_tile(
        &mut self,
        x: i32,
        tile_y: i32,
        block: Option<Block>,
    ) -> Result<(), WorldError> {
        let pos = BlockPos::from_tile(x, tile_y);
        if !pos.in_world() {
            return Err(WorldError::InvalidPosition { x, y: tile_y });
        }
        let (chunk_pos, local) = pos.split();
        let chunk = self
            .chunks
            .get_chunk_mut(chunk_pos)
            .ok_or(WorldError::ChunkNotLoaded(chunk_pos))?;
        chunk.set(local.x, local.y, block);
        Ok(())
    }

    /// Flag the chunk owning a screen tile as modified and refresh lighting
    pub fn mark_chunk_dirty(&mut self, x: i32, tile_y: i32) {
        let (chunk_pos, _) = BlockPos::from_tile(x, tile_y).split();
        if let Some(chunk) = self.chunks.get_chunk_mut(chunk_pos) {
            chunk.mark_dirty();
        }
        self.light.invalidate();
    }

    // Chunk access

    pub fn get_chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get_chunk(pos)
    }

    pub fn loaded_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.loaded_chunks()
    }

    /// Resident chunks overlapping a screen tile rectangle (corners inclusive)
    pub fn chunks_in_tile_range(&self, min: IVec2, max: IVec2) -> Vec<&Chunk> {
        let a = BlockPos::from_tile(min.x, min.y);
        let b = BlockPos::from_tile(max.x, max.y);
        let low = ChunkPos::from_block(a.x.min(b.x), a.y.min(b.y));
        let high = ChunkPos::from_block(a.x.max(b.x), a.y.max(b.y));

        let mut result = Vec::new();
        for cx in low.x..=high.x {
            for cy in low.y..=high.y {
                if let Some(chunk) = self.chunks.get_chunk(ChunkPos::new(cx, cy)) {
                    result.push(chunk);
                }
            }
        }
        result
    }

    // Streaming

    /// Chunk containing a focus point given in screen tile units
    fn focus_chunk(focus: DVec2) -> ChunkPos {
        let x = focus.x.floor() as i32;
        let tile_y = focus.y.floor() as i32;
        ChunkPos::from_block(x, screen_to_logical_y(tile_y))
    }

    /// Per-tick streaming driver
    pub fn update(&mut self, focus: DVec2) {
        let ready = self.chunks.drain_completed();
        let center = Self::focus_chunk(focus);

        if self.last_center == Some(center) {
            if !ready.is_empty() {
                self.run_feature_pass(&ready);
            }
            return;
        }

        self.update_chunks_around(center, ready);
    }

    /// Stream around `focus`, then evict and reload the 3×3 chunks around it
    /// so they reflect what is on disk
    pub fn force_initial_update(&mut self, focus: DVec2) {
        let center = Self::focus_chunk(focus);
        let ready = self.chunks.drain_completed();
        self.update_chunks_around(center, ready);

        let mut reload = Vec::new();
        for cx in center.x - 1..=center.x + 1 {
            for cy in center.y - 1..=center.y + 1 {
                let pos = ChunkPos::new(cx, cy);
                if self.chunks.is_loaded(pos) {
                    self.chunks.save_chunk(pos);
                    reload.push(pos);
                }
            }
        }
        if !reload.is_empty() {
            self.chunks.unload(&reload);
            self.light.invalidate();
            self.last_center = None;
            self.update_chunks_around(center, Vec::new());
        }
        // Loads queued by the first streaming pass must be resident on return
        self.complete_pending_loads();
    }

    /// Wait for every queued load and admit the results
    pub fn complete_pending_loads(&mut self) {
        if let Err(e) = self.chunks.io().flush() {
            log::warn!("[WorldManager::complete_pending_loads] Flush failed: {}", e);
        }
        let ready = self.chunks.drain_completed();
        if !ready.is_empty() {
            self.run_feature_pass(&ready);
        }
    }

    fn update_chunks_around(&mut self, center: ChunkPos, ready: Vec<ChunkPos>) {
        self.last_center = Some(center);
        let radius = self.config.load_radius;

        let mut feature_targets = ready;
        for cx in center.x - radius..=center.x + radius {
            for cy in center.y - radius..=center.y + radius {
                let pos = ChunkPos::new(cx, cy);
                if !pos.in_world() {
                    continue;
                }
                match self.chunks.get_chunk(pos) {
                    Some(chunk) => {
                        if chunk.needs_features() {
                            feature_targets.push(pos);
                        }
                    }
                    None => {
                        self.chunks.request_load(pos);
                    }
                }
            }
        }

        if !feature_targets.is_empty() {
            self.run_feature_pass(&feature_targets);
        }

        self.autosave_and_cleanup(center);
    }

    /// Run the feature pass on `targets` and every resident neighbour
    fn run_feature_pass(&mut self, targets: &[ChunkPos]) {
        let mut update_set = FxHashSet::default();
        for pos in targets {
            update_set.insert(*pos);
            update_set.extend(pos.neighbors().filter(|n| self.chunks.is_loaded(*n)));
        }

        let generator = Arc::clone(self.chunks.generator());
        let plans: Vec<(ChunkPos, Vec<FeatureEdit>)> = update_set
            .into_iter()
            .filter(|pos| self.chunks.is_loaded(*pos))
            .map(|pos| (pos, generator.plan_features(pos, &self.chunks)))
            .collect();

        log::debug!(
            "[WorldManager::run_feature_pass] Feature pass over {} chunks",
            plans.len()
        );
        for (pos, edits) in plans {
            if let Some(chunk) = self.chunks.get_chunk_mut(pos) {
                apply_features(chunk, &edits);
            }
        }
        self.light.invalidate();
    }

    fn autosave_and_cleanup(&mut self, center: ChunkPos) {
        let mut evict = Vec::new();
        for pos in self.chunks.loaded_positions() {
            let dx = (pos.x - center.x).abs();
            let dy = (pos.y - center.y).abs();

            if dx > self.config.autosave_radius || dy > self.config.autosave_radius {
                self.chunks.save_chunk(pos);
            }
            if dx > self.config.unload_radius || dy > self.config.unload_radius {
                evict.push(pos);
            }
        }

        if !evict.is_empty() {
            self.chunks.unload(&evict);
            self.light.invalidate();
        }
    }

    fn ensure_column_loaded(&mut self, chunk_x: i32) {
        for cy in 0..VERTICAL_CHUNKS {
            self.chunks.ensure_loaded_sync(ChunkPos::new(chunk_x, cy));
        }
    }

    /// Full streaming pass around a chunk, draining anything already finished
    fn stream_around(&mut self, center: ChunkPos) {
        let ready = self.chunks.drain_completed();
        self.update_chunks_around(center, ready);
    }

    /// Find a dry spawn point near `preferred_x`, in screen tile coordinates
    pub fn find_safe_spawn(&mut self, preferred_x: i32) -> IVec2 {
        let finder = SpawnFinder::new(self.config.spawn_search_radius);
        let mut scanned_chunk_column = None;

        for x in finder.candidate_columns(preferred_x) {
            let chunk_x = floor_div(x, CHUNK_SIZE);
            if scanned_chunk_column != Some(chunk_x) {
                self.ensure_column_loaded(chunk_x);
                scanned_chunk_column = Some(chunk_x);
            }

            if let Some(ground) = SpawnFinder::scan_column(&self.chunks, x) {
                let spawn_y = ground + 2;
                log::info!(
                    "[WorldManager::find_safe_spawn] Spawn at column {} above ground {}",
                    x,
                    ground
                );
                self.stream_around(ChunkPos::from_block(x, spawn_y.min(WORLD_HEIGHT - 1)));
                return IVec2::new(x, logical_to_screen_y(spawn_y));
            }
        }

        let fallback_tile_y = WORLD_HEIGHT / 2;
        log::warn!(
            "[WorldManager::find_safe_spawn] No dry column within {} chunks of {}, using fallback",
            self.config.spawn_search_radius,
            preferred_x
        );
        self.stream_around(ChunkPos::from_block(
            preferred_x,
            screen_to_logical_y(fallback_tile_y),
        ));
        IVec2::new(preferred_x, fallback_tile_y)
    }

    // Lighting

    fn refresh_light(&mut self) -> Option<&LightGrid> {
        let center = self.last_center?;
        let radius = self.config.load_radius;
        let origin_x = (center.x - radius) * CHUNK_SIZE;

        if self.light.grid.is_none() || self.light.origin_x != origin_x {
            let region = LightRegion {
                source: &self.chunks,
                origin_x,
                width: ((2 * radius + 1) * CHUNK_SIZE) as usize,
            };
            self.light.grid = Some(SkylightCalculator::compute(&region));
            self.light.origin_x = origin_x;
            log::debug!(
                "[WorldManager::refresh_light] Recomputed skylight from column {}",
                origin_x
            );
        }
        self.light.grid.as_ref()
    }

    /// Effective light at a screen tile, if it lies in the streamed area
    pub fn skylight_at_tile(&mut self, x: i32, tile_y: i32) -> Option<u8> {
        let logical_y = screen_to_logical_y(tile_y);
        if !(0..WORLD_HEIGHT).contains(&logical_y) {
            return None;
        }
        self.refresh_light()?;
        let local_x = x - self.light.origin_x;
        if local_x < 0 {
            return None;
        }
        self.light.grid.as_ref()?.get(local_x as usize, logical_y as usize)
    }

    /// Current light grid and the global X of its first column
    pub fn light_grid(&mut self) -> Option<(i32, &LightGrid)> {
        self.refresh_light()?;
        let origin_x = self.light.origin_x;
        self.light.grid.as_ref().map(|grid| (origin_x, grid))
    }

    // Persistence

    /// Blocking save of metadata and every dirty chunk
    pub fn save(&mut self, player: Option<DVec2>) -> EngineResult<usize> {
        let saved = self.chunks.save_world(self.config.seed, player)?;
        log::info!("[WorldManager::save] Saved {} dirty chunks", saved);
        Ok(saved)
    }

    /// Save every dirty chunk and wait for completion
    pub fn save_all(&mut self) -> EngineResult<usize> {
        Ok(self.chunks.save_all()?)
    }

    /// Save everything and stop background I/O
    pub fn close(&mut self) -> EngineResult<usize> {
        log::info!("[WorldManager::close] Closing world");
        self.chunks.close().map_err(EngineError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::core::BlockId;
    use tempfile::TempDir;

    fn config(dir: &TempDir, seed: i64) -> WorldManagerConfig {
        let _ = env_logger::builder().is_test(true).try_init();
        WorldManagerConfig {
            seed,
            save_dir: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    /// Flat ground at 60 everywhere; column 5 is flooded up to 63
    struct FloodedColumn;

    impl WorldGenerator for FloodedColumn {
        fn seed(&self) -> i64 {
            1
        }

        fn generate_chunk(&self, pos: ChunkPos) -> Chunk {
            let mut chunk = Chunk::new(pos);
            let (ox, oy) = pos.origin();
            for ly in 0..CHUNK_SIZE {
                for lx in 0..CHUNK_SIZE {
                    let (x, y) = (ox + lx, oy + ly);
                    let block = if y <= 60 {
                        Some(Block::STONE)
                    } else if x == 5 && y <= 63 {
                        Some(Block::WATER)
                    } else {
                        None
                    };
                    chunk.set_generated(lx, ly, block);
                }
            }
            chunk
        }

        fn plan_features(&self, _pos: ChunkPos, _world: &dyn BlockSource) -> Vec<FeatureEdit> {
            Vec::new()
        }

        fn surface_height(&self, _world_x: i32) -> i32 {
            60
        }
    }

    #[test]
    fn test_spawn_skips_submerged_column() {
        let dir = TempDir::new().expect("tempdir");
        let registry = Arc::new(RwLock::new(BlockRegistry::new()));
        let mut world =
            WorldManager::with_generator(config(&dir, 1), Arc::new(FloodedColumn), registry)
                .expect("open world");

        let spawn = world.find_safe_spawn(5);
        assert_eq!(spawn, IVec2::new(6, logical_to_screen_y(62)));
        // The area around the spawn is streamed in before returning
        assert!(world.get_block_at_tile(6, logical_to_screen_y(60)).is_some());
        assert!(world.stats().loaded_chunks + world.stats().pending_loads >= 49);
    }

    #[test]
    fn test_spawn_is_dry_with_terrain_generator() {
        let dir = TempDir::new().expect("tempdir");
        let mut world = WorldManager::new(config(&dir, 42)).expect("open world");
        let spawn = world.find_safe_spawn(0);

        let ground_tile = spawn.y + 2;
        let ground = world.get_block_at_tile(spawn.x, ground_tile);
        assert!(ground.map_or(false, |b| !b.is_water()));
        let above = world.get_block_at_tile(spawn.x, ground_tile - 1);
        assert!(above.map_or(true, |b| !b.is_water()));
    }

    #[test]
    fn test_tile_access_uses_screen_space() {
        let dir = TempDir::new().expect("tempdir");
        let mut world = WorldManager::new(config(&dir, 42)).expect("open world");
        world.find_safe_spawn(0);
        world.ensure_column_loaded(0);

        // Logical row 0 is the bottom screen row
        assert_eq!(world.get_block_at_tile(0, 255), Some(Block::STONE));
        assert_eq!(world.get_block_at_tile(0, 0), None);

        world.set_block_at_tile(0, 255, Some(Block::BEDROCK));
        assert_eq!(world.get_block(0, 0), Some(Block::BEDROCK));
        assert!(world
            .get_chunk(ChunkPos::new(0, 0))
            .expect("resident")
            .needs_saving());
    }

    #[test]
    fn test_set_block_on_missing_chunk_is_noop() {
        let dir = TempDir::new().expect("tempdir");
        let mut world = WorldManager::new(config(&dir, 42)).expect("open world");
        world.set_block_at_tile(10_000, 100, Some(Block::STONE));
        assert_eq!(world.get_block_at_tile(10_000, 100), None);
        assert!(matches!(
            world.try_set_block_at_tile(10_000, 100, None),
            Err(WorldError::ChunkNotLoaded(_))
        ));
        assert!(matches!(
            world.try_set_block_at_tile(0, 300, None),
            Err(WorldError::InvalidPosition { .. })
        ));
    }

    #[test]
    fn test_update_streams_and_evicts() {
        let dir = TempDir::new().expect("tempdir");
        let mut world = WorldManager::new(config(&dir, 42)).expect("open world");
        let focus = DVec2::new(8.0, logical_to_screen_y(70) as f64);

        world.update(focus);
        world.complete_pending_loads();
        let center = ChunkPos::from_block(8, 70);
        assert!(world.get_chunk(center).is_some());
        assert!(world
            .loaded_chunks()
            .all(|c| c.pos().chebyshev_distance(center) <= 3));
        assert!(world.loaded_chunks().all(|c| !c.needs_features()));

        // Move far to the right: the old area is evicted
        let far = DVec2::new(8.0 + 20.0 * CHUNK_SIZE as f64, focus.y);
        world.update(far);
        world.complete_pending_loads();
        assert!(world.get_chunk(center).is_none());
        let far_center = ChunkPos::from_block(8 + 20 * CHUNK_SIZE, 70);
        assert!(world.get_chunk(far_center).is_some());
    }

    #[test]
    fn test_edits_survive_eviction() {
        let dir = TempDir::new().expect("tempdir");
        let mut world = WorldManager::new(config(&dir, 42)).expect("open world");
        let focus = DVec2::new(0.0, logical_to_screen_y(70) as f64);
        world.update(focus);
        world.complete_pending_loads();

        let tile_y = logical_to_screen_y(20);
        world.set_block_at_tile(3, tile_y, None);
        world.mark_chunk_dirty(3, tile_y);

        world.update(DVec2::new(3000.0, focus.y));
        world.complete_pending_loads();
        assert!(world.get_chunk(ChunkPos::new(0, 0)).is_none());

        world.update(focus);
        world.complete_pending_loads();
        assert_eq!(world.get_block_at_tile(3, tile_y), None);
        assert_eq!(world.get_block_at_tile(4, tile_y), Some(Block::STONE));
    }

    #[test]
    fn test_initial_update_on_fresh_world() {
        let dir = TempDir::new().expect("tempdir");
        let mut world = WorldManager::new(config(&dir, 42)).expect("open world");
        let focus = DVec2::new(8.0, logical_to_screen_y(70) as f64);

        world.force_initial_update(focus);
        let center = ChunkPos::from_block(8, 70);
        assert!(world.get_chunk(center).is_some());
        assert_eq!(world.stats().pending_loads, 0);
        assert_eq!(world.stats().loaded_chunks, 49);
        assert!(world.get_block(8, 0).is_some());
    }

    #[test]
    fn test_save_and_reopen_restores_every_cell() {
        let dir = TempDir::new().expect("tempdir");
        let focus = DVec2::new(8.0, logical_to_screen_y(70) as f64);

        let mut world = WorldManager::new(config(&dir, 42)).expect("open world");
        world.force_initial_update(focus);
        for (x, logical_y, block) in [
            (0, 20, None),
            (8, 70, Some(Block::BEDROCK)),
            (-17, 40, Some(Block::BEDROCK)),
            (30, 120, Some(Block::SAND)),
        ] {
            let tile_y = logical_to_screen_y(logical_y);
            world.set_block_at_tile(x, tile_y, block);
            world.mark_chunk_dirty(x, tile_y);
        }

        let mut before: Vec<(ChunkPos, Vec<Option<Block>>)> = world
            .loaded_chunks()
            .map(|chunk| (chunk.pos(), chunk.blocks().to_vec()))
            .collect();
        before.sort_by_key(|(pos, _)| (pos.x, pos.y));
        let player = focus;
        assert!(world.save(Some(player)).expect("save") >= 4);
        world.close().expect("close");
        drop(world);

        let mut reopened = WorldManager::new(config(&dir, 42)).expect("reopen world");
        assert_eq!(reopened.load_world(), Some(player));
        reopened.force_initial_update(player);
        assert_eq!(reopened.stats().loaded_chunks, before.len());

        for (pos, cells) in &before {
            let chunk = reopened
                .get_chunk(*pos)
                .unwrap_or_else(|| panic!("chunk {} not resident after reopen", pos));
            for (i, (saved, restored)) in cells.iter().zip(chunk.blocks()).enumerate() {
                assert_eq!(saved, restored, "chunk {} cell {}", pos, i);
            }
        }
    }

    #[test]
    fn test_chunks_in_tile_range() {
        let dir = TempDir::new().expect("tempdir");
        let mut world = WorldManager::new(config(&dir, 42)).expect("open world");
        world.update(DVec2::new(0.0, logical_to_screen_y(70) as f64));
        world.complete_pending_loads();

        // Screen rows 176..=207 are logical rows 48..=79, chunk rows 3 and 4
        let chunks = world.chunks_in_tile_range(IVec2::new(0, 176), IVec2::new(31, 207));
        let mut positions: Vec<ChunkPos> = chunks.iter().map(|c| c.pos()).collect();
        positions.sort();
        assert_eq!(
            positions,
            vec![
                ChunkPos::new(0, 3),
                ChunkPos::new(0, 4),
                ChunkPos::new(1, 3),
                ChunkPos::new(1, 4)
            ]
        );
    }

    #[test]
    fn test_shoreline_sand_after_streaming() {
        let dir = TempDir::new().expect("tempdir");
        let mut world = WorldManager::new(config(&dir, 42)).expect("open world");
        let generator = TerrainGenerator::new(42);
        // A column whose grass cap sits below sea level borders water
        let x = (-4096..4096)
            .find(|&x| generator.surface_height(x) < 63)
            .expect("a submerged column");
        let surface = generator.surface_height(x);
        world.update(DVec2::new(x as f64, logical_to_screen_y(surface) as f64));
        world.complete_pending_loads();

        let top = world.get_block(x, surface).expect("surface block");
        assert_eq!(top.id, BlockId::SAND);
    }

    #[test]
    fn test_light_follows_terrain() {
        let dir = TempDir::new().expect("tempdir");
        let mut world = WorldManager::new(config(&dir, 42)).expect("open world");
        assert_eq!(world.skylight_at_tile(0, 0), None);

        world.update(DVec2::new(0.0, logical_to_screen_y(70) as f64));
        world.complete_pending_loads();
        for chunk_x in -1..=1 {
            world.ensure_column_loaded(chunk_x);
        }

        // Top of the world is open sky, the floor is deep inside stone
        assert_eq!(world.skylight_at_tile(0, 0), Some(15));
        assert_eq!(world.skylight_at_tile(0, 255), Some(0));

        // Digging a shaft to the floor lets light in once flagged
        for logical_y in 0..=WORLD_HEIGHT - 1 {
            world.set_block_at_tile(0, logical_to_screen_y(logical_y), None);
        }
        assert_eq!(world.skylight_at_tile(0, 255), Some(0));
        world.mark_chunk_dirty(0, 255);
        assert_eq!(world.skylight_at_tile(0, 255), Some(15));
    }
}
