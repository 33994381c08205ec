//! Chunk Manager
//!
//! Owns the resident chunk map. Each chunk key moves through
//! `Unloaded -> PendingLoad -> Loaded`. Async load results come back on a
//! completion channel and are applied only from the owning thread in
//! [`ChunkManager::drain_completed`]; the pending map is the only state the
//! I/O side can observe concurrently.

use crate::persistence::chunk_serializer_operations::snapshot_chunk;
use crate::persistence::{
    ChunkIoManager, ChunkLoadResult, ChunkSnapshot, PersistenceError, PersistenceResult,
    SaveOutcome, WorldMetadata, WorldSaveRequest,
};
use crate::world::core::{Block, BlockSource, ChunkPos, SharedBlockRegistry};
use crate::world::generation::WorldGenerator;
use crate::world::storage::Chunk;
use crossbeam_channel::{unbounded, Receiver, Sender};
use dashmap::DashMap;
use glam::DVec2;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use std::time::Instant;

/// Chunk statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub loaded_chunks: usize,
    pub pending_loads: usize,
    pub dirty_chunks: usize,
    pub in_flight_saves: usize,
    /// Evicted chunks whose save has not been confirmed yet
    pub unsaved_evicted: usize,
}

pub struct ChunkManager {
    generator: Arc<dyn WorldGenerator>,
    registry: SharedBlockRegistry,
    io: ChunkIoManager,

    loaded: FxHashMap<ChunkPos, Chunk>,
    /// In-flight async loads and when they were requested
    pending: Arc<DashMap<ChunkPos, Instant>>,
    completed_tx: Sender<ChunkLoadResult>,
    completed_rx: Receiver<ChunkLoadResult>,
    /// Chunks made resident outside `drain_completed`, reported by the next drain
    ready_backlog: Vec<ChunkPos>,

    save_ack_tx: Sender<SaveOutcome>,
    save_ack_rx: Receiver<SaveOutcome>,
    /// Revision currently queued for saving, per chunk
    in_flight_saves: FxHashMap<ChunkPos, u64>,
    /// Evicted dirty chunks, kept until a save of their revision succeeds
    unsaved: FxHashMap<ChunkPos, Chunk>,
}

impl ChunkManager {
    pub fn new(
        generator: Arc<dyn WorldGenerator>,
        registry: SharedBlockRegistry,
        io: ChunkIoManager,
    ) -> Self {
        let (completed_tx, completed_rx) = unbounded();
        let (save_ack_tx, save_ack_rx) = unbounded();
        Self {
            generator,
            registry,
            io,
            loaded: FxHashMap::default(),
            pending: Arc::new(DashMap::new()),
            completed_tx,
            completed_rx,
            ready_backlog: Vec::new(),
            save_ack_tx,
            save_ack_rx,
            in_flight_saves: FxHashMap::default(),
            unsaved: FxHashMap::default(),
        }
    }

    pub fn generator(&self) -> &Arc<dyn WorldGenerator> {
        &self.generator
    }

    pub fn io(&self) -> &ChunkIoManager {
        &self.io
    }

    pub fn get_chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.loaded.get(&pos)
    }

    pub fn get_chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        self.loaded.get_mut(&pos)
    }

    pub fn loaded_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.loaded.values()
    }

    pub fn loaded_positions(&self) -> Vec<ChunkPos> {
        self.loaded.keys().copied().collect()
    }

    pub fn is_loaded(&self, pos: ChunkPos) -> bool {
        self.loaded.contains_key(&pos)
    }

    pub fn is_pending(&self, pos: ChunkPos) -> bool {
        self.pending.contains_key(&pos)
    }

    pub fn get_stats(&self) -> ChunkStats {
        ChunkStats {
            loaded_chunks: self.loaded.len(),
            pending_loads: self.pending.len(),
            dirty_chunks: self.loaded.values().filter(|c| c.needs_saving()).count(),
            in_flight_saves: self.in_flight_saves.len(),
            unsaved_evicted: self.unsaved.len(),
        }
    }

    fn generate(&self, pos: ChunkPos) -> Chunk {
        log::debug!("[ChunkManager::generate] Generating chunk {}", pos);
        self.generator.generate_chunk(pos)
    }

    /// Make a chunk resident and remember it for the next drain
    fn admit(&mut self, chunk: Chunk) {
        let pos = chunk.pos();
        self.loaded.insert(pos, chunk);
        self.ready_backlog.push(pos);
    }

    /// Bring back an evicted chunk whose save never went through
    fn restore_unsaved(&mut self, pos: ChunkPos) -> bool {
        match self.unsaved.remove(&pos) {
            Some(chunk) => {
                log::debug!("[ChunkManager] Restoring unsaved chunk {}", pos);
                self.admit(chunk);
                true
            }
            None => false,
        }
    }

    /// Turn a load result into a resident chunk. Failures and misses regenerate.
    fn resolve_load(&self, pos: ChunkPos, result: PersistenceResult<Option<Chunk>>) -> Chunk {
        match result {
            Ok(Some(chunk)) => {
                log::debug!("[ChunkManager] Loaded chunk {} from disk", pos);
                chunk
            }
            Ok(None) => self.generate(pos),
            Err(e) => {
                log::warn!(
                    "[ChunkManager] Could not read chunk {} ({}), regenerating",
                    pos,
                    e
                );
                self.generate(pos)
            }
        }
    }

    /// Block until `pos` is resident
    pub fn ensure_loaded_sync(&mut self, pos: ChunkPos) {
        if self.loaded.contains_key(&pos) || self.restore_unsaved(pos) {
            return;
        }

        if self.pending.contains_key(&pos) {
            // The worker is sequential: after a flush the pending result is in the queue
            match self.io.flush() {
                Ok(()) => self.apply_completed_loads(),
                Err(e) => {
                    log::warn!(
                        "[ChunkManager::ensure_loaded_sync] Pending load of {} lost ({})",
                        pos,
                        e
                    );
                    self.pending.remove(&pos);
                }
            }
            if self.loaded.contains_key(&pos) {
                return;
            }
            self.pending.remove(&pos);
        }

        let result = self.io.load_chunk(pos);
        let chunk = self.resolve_load(pos, result);
        self.admit(chunk);
    }

    /// Queue an async load. Returns whether a new request was issued.
    pub fn request_load(&mut self, pos: ChunkPos) -> bool {
        if !pos.in_world() || self.loaded.contains_key(&pos) || self.pending.contains_key(&pos) {
            return false;
        }
        if self.restore_unsaved(pos) {
            return false;
        }

        self.pending.insert(pos, Instant::now());
        if let Err(e) = self.io.load_chunk_async(pos, self.completed_tx.clone()) {
            log::warn!(
                "[ChunkManager::request_load] Could not queue load of {} ({}), generating",
                pos,
                e
            );
            self.pending.remove(&pos);
            let chunk = self.generate(pos);
            self.admit(chunk);
            return false;
        }
        log::debug!("[ChunkManager::request_load] Requested chunk {}", pos);
        true
    }

    fn apply_completed_loads(&mut self) {
        while let Ok(ChunkLoadResult { pos, result }) = self.completed_rx.try_recv() {
            if let Some((_, requested)) = self.pending.remove(&pos) {
                log::debug!(
                    "[ChunkManager] Load of {} completed after {:?}",
                    pos,
                    requested.elapsed()
                );
            }
            // A synchronous path got there first
            if self.loaded.contains_key(&pos) {
                continue;
            }
            if self.restore_unsaved(pos) {
                continue;
            }
            let chunk = self.resolve_load(pos, result);
            self.admit(chunk);
        }
    }

    /// Apply every finished load and save. Returns the newly resident chunks.
    pub fn drain_completed(&mut self) -> Vec<ChunkPos> {
        self.apply_save_outcomes();
        self.apply_completed_loads();

        let mut seen = FxHashSet::default();
        let backlog = std::mem::take(&mut self.ready_backlog);
        backlog
            .into_iter()
            .filter(|pos| self.loaded.contains_key(pos) && seen.insert(*pos))
            .collect()
    }

    /// Evict chunks. Dirty chunks must already have a save queued.
    pub fn unload(&mut self, keys: &[ChunkPos]) -> usize {
        let mut evicted = 0;
        for pos in keys {
            let Some(chunk) = self.loaded.remove(pos) else {
                continue;
            };
            evicted += 1;
            if chunk.needs_saving() {
                if self.in_flight_saves.get(pos) != Some(&chunk.revision()) {
                    log::warn!(
                        "[ChunkManager::unload] Chunk {} evicted without a queued save, saving now",
                        pos
                    );
                    self.queue_snapshot(&chunk);
                }
                self.unsaved.insert(*pos, chunk);
            }
        }
        if evicted > 0 {
            log::debug!("[ChunkManager::unload] Evicted {} chunks", evicted);
        }
        evicted
    }

    fn queue_snapshot(&mut self, chunk: &Chunk) -> bool {
        let pos = chunk.pos();
        if self.in_flight_saves.get(&pos) == Some(&chunk.revision()) {
            return false;
        }
        let snapshot = snapshot_chunk(chunk, &self.registry.read());
        match self.io.save_chunk(snapshot, self.save_ack_tx.clone()) {
            Ok(()) => {
                self.in_flight_saves.insert(pos, chunk.revision());
                true
            }
            Err(e) => {
                log::error!("[ChunkManager] Could not queue save of {}: {}", pos, e);
                false
            }
        }
    }

    /// Queue an async save of a dirty chunk. Returns whether a save was queued.
    pub fn save_chunk(&mut self, pos: ChunkPos) -> bool {
        let chunk = match self.loaded.get(&pos).or_else(|| self.unsaved.get(&pos)) {
            Some(chunk) if chunk.needs_saving() => chunk.clone(),
            _ => return false,
        };
        self.queue_snapshot(&chunk)
    }

    fn apply_save_outcomes(&mut self) -> usize {
        let mut failures = 0;
        while let Ok(outcome) = self.save_ack_rx.try_recv() {
            let SaveOutcome {
                pos,
                revision,
                result,
            } = outcome;
            if self.in_flight_saves.get(&pos) == Some(&revision) {
                self.in_flight_saves.remove(&pos);
            }
            match result {
                Ok(()) => self.mark_revision_saved(pos, revision),
                Err(e) => {
                    failures += 1;
                    log::warn!(
                        "[ChunkManager] Save of chunk {} failed ({}), keeping it dirty",
                        pos,
                        e
                    );
                }
            }
        }
        failures
    }

    /// Clear the dirty flag if nothing changed since the saved revision
    fn mark_revision_saved(&mut self, pos: ChunkPos, revision: u64) {
        if let Some(chunk) = self.loaded.get_mut(&pos) {
            if chunk.revision() == revision {
                chunk.mark_saved();
            }
        }
        if self
            .unsaved
            .get(&pos)
            .map_or(false, |chunk| chunk.revision() == revision)
        {
            self.unsaved.remove(&pos);
        }
    }

    /// Save every dirty chunk and wait for the writes to finish
    pub fn save_all(&mut self) -> PersistenceResult<usize> {
        let dirty: Vec<Chunk> = self
            .loaded
            .values()
            .chain(self.unsaved.values())
            .filter(|c| c.needs_saving())
            .cloned()
            .collect();
        let mut queued = 0;
        for chunk in &dirty {
            if self.queue_snapshot(chunk) {
                queued += 1;
            }
        }

        self.io.flush()?;
        let failures = self.apply_save_outcomes();
        if failures > 0 {
            return Err(PersistenceError::SaveFailed {
                path: self.io.archive_path().display().to_string(),
                error: format!("{} chunk saves failed", failures),
            });
        }
        log::info!("[ChunkManager::save_all] Saved {} chunks", queued);
        Ok(queued)
    }

    /// Blocking full save: metadata plus every dirty chunk in one rewrite
    pub fn save_world(&mut self, seed: i64, player: Option<DVec2>) -> PersistenceResult<usize> {
        // Settle async saves first so their outcomes do not race this one
        self.io.flush()?;
        self.apply_save_outcomes();

        let snapshots: Vec<ChunkSnapshot> = {
            let registry = self.registry.read();
            self.loaded
                .values()
                .chain(self.unsaved.values())
                .filter(|c| c.needs_saving())
                .map(|c| snapshot_chunk(c, &registry))
                .collect()
        };
        let saved: Vec<(ChunkPos, u64)> = snapshots.iter().map(|s| (s.pos, s.revision)).collect();

        self.io.save_world(WorldSaveRequest {
            seed,
            player,
            chunks: snapshots,
        })?;

        for (pos, revision) in &saved {
            self.mark_revision_saved(*pos, *revision);
        }
        Ok(saved.len())
    }

    /// Read archive metadata
    pub fn load_metadata(&self) -> PersistenceResult<WorldMetadata> {
        self.io.load_world()
    }

    /// Save everything and stop the I/O worker
    pub fn close(&mut self) -> PersistenceResult<usize> {
        let result = self.save_all();
        self.io.shutdown();
        result
    }
}

impl BlockSource for ChunkManager {
    fn block_at(&self, x: i32, logical_y: i32) -> Option<Block> {
        let (chunk, local) = crate::world::core::BlockPos::new(x, logical_y).split();
        self.loaded
            .get(&chunk)
            .and_then(|c| c.get(local.x, local.y))
    }
}
