//! Chunk I/O manager
//!
//! Every archive access runs on one dedicated worker thread, strictly in
//! submission order. Callers talk to it through a job channel and get
//! answers back on reply channels, so the game thread never touches the
//! file and never shares a live chunk with the worker.

use super::chunk_serializer_data::ChunkSnapshot;
use super::chunk_serializer_operations::{decode_chunk, entry_name};
use super::metadata_data::WorldMetadata;
use super::metadata_operations::read_metadata;
use super::world_save_data::{ArchiveReadMode, WorldSaveRequest};
use super::world_save_operations::{read_archive, read_entry, save_chunk_record, save_world};
use super::{PersistenceError, PersistenceResult};
use crate::constants::persistence::{ARCHIVE_FILE_NAME, IO_THREAD_NAME};
use crate::world::core::{ChunkPos, SharedBlockRegistry};
use crate::world::storage::Chunk;
use crossbeam_channel::{bounded, unbounded, Sender};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

/// Result of a chunk load. `Ok(None)` means the chunk is not on disk.
#[derive(Debug)]
pub struct ChunkLoadResult {
    pub pos: ChunkPos,
    pub result: PersistenceResult<Option<Chunk>>,
}

/// Acknowledgement of an asynchronous chunk save
#[derive(Debug)]
pub struct SaveOutcome {
    pub pos: ChunkPos,
    pub revision: u64,
    pub result: PersistenceResult<()>,
}

enum IoJob {
    LoadChunk {
        pos: ChunkPos,
        reply: Sender<ChunkLoadResult>,
    },
    SaveChunk {
        snapshot: ChunkSnapshot,
        reply: Sender<SaveOutcome>,
    },
    SaveWorld {
        request: WorldSaveRequest,
        reply: Sender<PersistenceResult<()>>,
    },
    LoadMetadata {
        reply: Sender<PersistenceResult<WorldMetadata>>,
    },
    Flush {
        reply: Sender<()>,
    },
    Shutdown,
}

struct IoWorker {
    archive: PathBuf,
    registry: SharedBlockRegistry,
}

impl IoWorker {
    fn run(self, jobs: crossbeam_channel::Receiver<IoJob>) {
        log::debug!("[ChunkIoManager] Worker started for {}", self.archive.display());
        for job in jobs {
            match job {
                IoJob::LoadChunk { pos, reply } => {
                    let result = self.load_chunk(pos);
                    // The requester may have gone away; nothing to do then
                    let _ = reply.send(ChunkLoadResult { pos, result });
                }
                IoJob::SaveChunk { snapshot, reply } => {
                    let result = save_chunk_record(&self.archive, &snapshot);
                    if let Err(e) = &result {
                        log::error!(
                            "[ChunkIoManager] Failed to save chunk {}: {}",
                            snapshot.pos,
                            e
                        );
                    }
                    let _ = reply.send(SaveOutcome {
                        pos: snapshot.pos,
                        revision: snapshot.revision,
                        result,
                    });
                }
                IoJob::SaveWorld { request, reply } => {
                    let result = save_world(&self.archive, &request);
                    let _ = reply.send(result);
                }
                IoJob::LoadMetadata { reply } => {
                    let result = read_archive(&self.archive, ArchiveReadMode::MetadataOnly)
                        .map(|entries| read_metadata(&entries.metadata));
                    let _ = reply.send(result);
                }
                IoJob::Flush { reply } => {
                    let _ = reply.send(());
                }
                IoJob::Shutdown => break,
            }
        }
        log::debug!("[ChunkIoManager] Worker stopped");
    }

    fn load_chunk(&self, pos: ChunkPos) -> PersistenceResult<Option<Chunk>> {
        match read_entry(&self.archive, &entry_name(pos))? {
            None => Ok(None),
            Some(body) => {
                let mut registry = self.registry.write();
                decode_chunk(pos, &body, &mut registry).map(Some)
            }
        }
    }
}

/// Owner of the `chunk-io-thread` worker
pub struct ChunkIoManager {
    archive: PathBuf,
    jobs: Sender<IoJob>,
    worker: Option<JoinHandle<()>>,
}

impl ChunkIoManager {
    /// Start the worker for the archive inside `save_dir`
    pub fn new(save_dir: impl AsRef<Path>, registry: SharedBlockRegistry) -> PersistenceResult<Self> {
        let archive = save_dir.as_ref().join(ARCHIVE_FILE_NAME);
        let (jobs, rx) = unbounded();
        let worker = IoWorker {
            archive: archive.clone(),
            registry,
        };
        let handle = std::thread::Builder::new()
            .name(IO_THREAD_NAME.to_string())
            .spawn(move || worker.run(rx))
            .map_err(|e| PersistenceError::WorkerUnavailable(format!("spawn failed: {}", e)))?;

        log::info!("[ChunkIoManager::new] Using archive {}", archive.display());
        Ok(Self {
            archive,
            jobs,
            worker: Some(handle),
        })
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive
    }

    fn submit(&self, job: IoJob) -> PersistenceResult<()> {
        self.jobs
            .send(job)
            .map_err(|_| PersistenceError::WorkerUnavailable(IO_THREAD_NAME.to_string()))
    }

    /// Load a chunk, blocking until the worker has read it
    pub fn load_chunk(&self, pos: ChunkPos) -> PersistenceResult<Option<Chunk>> {
        let (reply, rx) = bounded(1);
        self.submit(IoJob::LoadChunk { pos, reply })?;
        rx.recv()
            .map_err(|_| PersistenceError::ChannelClosed(format!("load reply for {}", pos)))?
            .result
    }

    /// Queue a chunk load; the result is delivered on `sink`
    pub fn load_chunk_async(&self, pos: ChunkPos, sink: Sender<ChunkLoadResult>) -> PersistenceResult<()> {
        self.submit(IoJob::LoadChunk { pos, reply: sink })
    }

    /// Queue a chunk save; the outcome is delivered on `ack`
    pub fn save_chunk(&self, snapshot: ChunkSnapshot, ack: Sender<SaveOutcome>) -> PersistenceResult<()> {
        self.submit(IoJob::SaveChunk {
            snapshot,
            reply: ack,
        })
    }

    /// Write metadata and the given chunks, blocking until the archive is rewritten
    pub fn save_world(&self, request: WorldSaveRequest) -> PersistenceResult<()> {
        let (reply, rx) = bounded(1);
        let count = request.chunks.len();
        self.submit(IoJob::SaveWorld { request, reply })?;
        let result = rx
            .recv()
            .map_err(|_| PersistenceError::ChannelClosed("world save reply".to_string()))?;
        match &result {
            Ok(()) => log::info!(
                "[ChunkIoManager::save_world] Saved world with {} chunk records to {}",
                count,
                self.archive.display()
            ),
            Err(e) => log::error!("[ChunkIoManager::save_world] World save failed: {}", e),
        }
        result
    }

    /// Read metadata records only
    pub fn load_world(&self) -> PersistenceResult<WorldMetadata> {
        let (reply, rx) = bounded(1);
        self.submit(IoJob::LoadMetadata { reply })?;
        rx.recv()
            .map_err(|_| PersistenceError::ChannelClosed("metadata reply".to_string()))?
    }

    /// Block until every job submitted so far has finished
    pub fn flush(&self) -> PersistenceResult<()> {
        let (reply, rx) = bounded(1);
        self.submit(IoJob::Flush { reply })?;
        rx.recv()
            .map_err(|_| PersistenceError::ChannelClosed("flush reply".to_string()))
    }

    /// Finish queued work and stop the worker. Safe to call twice.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        // Jobs queued before Shutdown still run
        let _ = self.jobs.send(IoJob::Shutdown);
        if handle.join().is_err() {
            log::error!("[ChunkIoManager::shutdown] I/O worker panicked");
        } else {
            log::info!("[ChunkIoManager::shutdown] I/O worker stopped");
        }
    }
}

impl Drop for ChunkIoManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
