//! World Save Operations
//!
//! Reading and rewriting the world archive. Every write rewrites the whole
//! archive into `<archive>.tmp` and renames it into place, so a crash mid
//! write leaves the previous archive intact.

use super::chunk_serializer_data::ChunkSnapshot;
use super::chunk_serializer_operations::entry_name;
use super::metadata_operations::store_metadata;
use super::world_save_data::{ArchiveEntries, ArchiveReadMode, WorldSaveRequest};
use super::{PersistenceError, PersistenceResult};
use crate::constants::persistence::CHUNK_ENTRY_PREFIX;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

fn is_chunk_entry(name: &str) -> bool {
    name.starts_with(CHUNK_ENTRY_PREFIX)
}

/// Map an error raised while decoding the archive stream
///
/// Malformed gzip or tar data surfaces as these kinds; anything else is an
/// I/O failure that says nothing about the archive contents.
fn stream_error(path: &Path) -> impl Fn(io::Error) -> PersistenceError + '_ {
    move |error| match error.kind() {
        io::ErrorKind::InvalidData
        | io::ErrorKind::InvalidInput
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::Other => {
            PersistenceError::CorruptedData(format!("{}: {}", path.display(), error))
        }
        _ => PersistenceError::IoError {
            path: path.display().to_string(),
            error,
        },
    }
}

/// Read the archive. A missing archive reads as empty.
pub fn read_archive(path: &Path, mode: ArchiveReadMode) -> PersistenceResult<ArchiveEntries> {
    let mut entries = ArchiveEntries::default();
    if !path.exists() {
        return Ok(entries);
    }

    let file = File::open(path).map_err(PersistenceError::io(path))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    let stream = stream_error(path);
    for entry in archive.entries().map_err(&stream)? {
        let mut entry = entry.map_err(&stream)?;
        let name = entry
            .path()
            .map_err(&stream)?
            .to_string_lossy()
            .into_owned();

        let is_chunk = is_chunk_entry(&name);
        if is_chunk && mode == ArchiveReadMode::MetadataOnly {
            continue;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut data)
            .map_err(&stream)?;
        if is_chunk {
            entries.chunks.insert(name, data);
        } else {
            entries.metadata.insert(name, data);
        }
    }

    Ok(entries)
}

/// Scan the archive for one entry. `Ok(None)` when the entry or archive is missing.
pub fn read_entry(path: &Path, wanted: &str) -> PersistenceResult<Option<Vec<u8>>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path).map_err(PersistenceError::io(path))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    let stream = stream_error(path);
    for entry in archive.entries().map_err(&stream)? {
        let mut entry = entry.map_err(&stream)?;
        let matches = entry
            .path()
            .map_err(&stream)?
            .to_str()
            .map_or(false, |name| name == wanted);
        if matches {
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .map_err(&stream)?;
            return Ok(Some(data));
        }
    }

    Ok(None)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn append_entry<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    name: &str,
    data: &[u8],
) -> std::io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, data)
}

/// Rewrite the whole archive: metadata entries first, then chunk records
pub fn write_archive(path: &Path, entries: &ArchiveEntries) -> PersistenceResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(PersistenceError::io(parent))?;
        }
    }

    let tmp = temp_path(path);
    let write = || -> std::io::Result<()> {
        let file = File::create(&tmp)?;
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in entries.metadata.iter().chain(entries.chunks.iter()) {
            append_entry(&mut builder, name, data)?;
        }
        let writer = builder.into_inner()?.finish()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    };

    if let Err(error) = write() {
        let _ = fs::remove_file(&tmp);
        return Err(PersistenceError::IoError {
            path: tmp.display().to_string(),
            error,
        });
    }

    fs::rename(&tmp, path).map_err(PersistenceError::io(path))
}

/// Read the current archive for a merge-and-rewrite
///
/// An archive whose contents cannot be decoded is moved aside to
/// `<archive>.corrupt` so the save can still go through. Plain I/O failures
/// are returned and the save fails.
fn read_for_merge(path: &Path) -> PersistenceResult<ArchiveEntries> {
    match read_archive(path, ArchiveReadMode::Full) {
        Err(PersistenceError::CorruptedData(reason)) => {
            let mut backup = path.as_os_str().to_owned();
            backup.push(".corrupt");
            log::error!(
                "[world_save::read_for_merge] Archive {} unreadable ({}), moving it to {:?}",
                path.display(),
                reason,
                backup
            );
            fs::rename(path, &backup).map_err(PersistenceError::io(path))?;
            Ok(ArchiveEntries::default())
        }
        other => other,
    }
}

/// Merge one chunk record into the archive
pub fn save_chunk_record(path: &Path, snapshot: &ChunkSnapshot) -> PersistenceResult<()> {
    let mut entries = read_for_merge(path)?;
    entries
        .chunks
        .insert(entry_name(snapshot.pos), snapshot.body.clone());
    write_archive(path, &entries)
}

/// Merge metadata and every given chunk record into the archive
pub fn save_world(path: &Path, request: &WorldSaveRequest) -> PersistenceResult<()> {
    let mut entries = read_for_merge(path)?;
    store_metadata(&mut entries.metadata, request.seed, request.player);
    for snapshot in &request.chunks {
        entries
            .chunks
            .insert(entry_name(snapshot.pos), snapshot.body.clone());
    }
    write_archive(path, &entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::metadata_operations::read_metadata;
    use crate::world::core::ChunkPos;
    use glam::DVec2;
    use tempfile::TempDir;

    fn snapshot(x: i32, y: i32, body: &str) -> ChunkSnapshot {
        ChunkSnapshot {
            pos: ChunkPos::new(x, y),
            revision: 1,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_missing_archive_reads_empty() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("world.wgz");
        let entries = read_archive(&path, ArchiveReadMode::Full).expect("read");
        assert!(entries.metadata.is_empty() && entries.chunks.is_empty());
        assert_eq!(read_entry(&path, "meta.dat").expect("read"), None);
    }

    #[test]
    fn test_save_merges_with_existing_records() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("world.wgz");

        save_chunk_record(&path, &snapshot(0, 3, "256*air")).expect("save first");
        save_chunk_record(&path, &snapshot(-1, 3, "256*stone")).expect("save second");
        save_world(
            &path,
            &WorldSaveRequest {
                seed: 42,
                player: Some(DVec2::new(3.0, 190.0)),
                chunks: vec![snapshot(0, 3, "256*dirt")],
            },
        )
        .expect("save world");

        let entries = read_archive(&path, ArchiveReadMode::Full).expect("read");
        assert_eq!(entries.chunks.len(), 2);
        assert_eq!(
            entries.chunks.get("chunks/chunk_0_3.dat").map(Vec::as_slice),
            Some(&b"256*dirt"[..])
        );
        assert_eq!(
            read_entry(&path, "chunks/chunk_-1_3.dat").expect("read"),
            Some(b"256*stone".to_vec())
        );

        let meta = read_metadata(&entries.metadata);
        assert_eq!(meta.seed, Some(42));
        assert_eq!(meta.player, Some(DVec2::new(3.0, 190.0)));
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_metadata_only_skips_chunks() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("world.wgz");
        save_world(
            &path,
            &WorldSaveRequest {
                seed: 1,
                player: None,
                chunks: vec![snapshot(0, 0, "256*air")],
            },
        )
        .expect("save");

        let entries = read_archive(&path, ArchiveReadMode::MetadataOnly).expect("read");
        assert!(entries.chunks.is_empty());
        assert!(entries.metadata.contains_key("meta.dat"));
    }

    #[test]
    fn test_corrupt_archive_is_moved_aside() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("world.wgz");
        fs::write(&path, b"definitely not gzip").expect("write garbage");

        assert!(read_archive(&path, ArchiveReadMode::Full).is_err());
        save_chunk_record(&path, &snapshot(2, 2, "256*air")).expect("save over corrupt");

        assert!(dir.path().join("world.wgz.corrupt").exists());
        assert!(read_entry(&path, "chunks/chunk_2_2.dat").expect("read").is_some());
    }

    #[test]
    fn test_truncated_archive_is_moved_aside() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("world.wgz");
        save_chunk_record(&path, &snapshot(1, 1, "256*stone")).expect("save");
        let bytes = fs::read(&path).expect("read archive");
        fs::write(&path, &bytes[..bytes.len() / 2]).expect("truncate");

        assert!(matches!(
            read_archive(&path, ArchiveReadMode::Full),
            Err(PersistenceError::CorruptedData(_))
        ));
        save_chunk_record(&path, &snapshot(2, 2, "256*air")).expect("save over truncated");
        assert!(dir.path().join("world.wgz.corrupt").exists());
    }

    #[test]
    fn test_io_failure_keeps_archive_in_place() {
        let dir = TempDir::new().expect("tempdir");
        // A directory where the archive should be cannot be read as a file
        let path = dir.path().join("world.wgz");
        fs::create_dir(&path).expect("create dir");

        let err = save_chunk_record(&path, &snapshot(0, 0, "256*air")).unwrap_err();
        assert!(matches!(err, PersistenceError::IoError { .. }));
        assert!(path.is_dir());
        assert!(!dir.path().join("world.wgz.corrupt").exists());
    }
}
