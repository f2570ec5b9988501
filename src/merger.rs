// Licensed under the MIT License

//! Appends completed chunks into the destination file in start-offset
//! order, with a memory-mapped fast path for large destinations.
//!
//! Adapted from a memory-mapped writer that wrote at arbitrary offsets
//! concurrently; merging only ever appends in a single pass once every
//! chunk has finished, so the mmap path here is a straight sequential
//! copy rather than concurrent offset writes.

use memmap2::MmapMut;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::chunk::{Chunk, ChunkBackend};
use crate::error::{DownloadError, Result};

/// Above this destination size, merge via a memory map instead of
/// sequential `Write` calls.
const MMAP_THRESHOLD_BYTES: u64 = 10 * 1024 * 1024;

pub struct Merger;

impl Merger {
    /// Append `chunks` (assumed sorted by `start`) into `destination`,
    /// then delete each chunk's temp file if `cleanup_temp_files` is set.
    /// `destination` must not already exist (the orchestrator removes a
    /// stale file pre-flight).
    pub async fn merge(destination: &Path, chunks: &[Chunk], total_size: u64, cleanup_temp_files: bool) -> Result<()> {
        let use_mmap = total_size > MMAP_THRESHOLD_BYTES && total_size < 4u64 * 1024 * 1024 * 1024;

        if use_mmap {
            Self::merge_mmap(destination, chunks, total_size, cleanup_temp_files).await
        } else {
            Self::merge_sequential(destination, chunks, cleanup_temp_files).await
        }
    }

    async fn merge_sequential(destination: &Path, chunks: &[Chunk], cleanup_temp_files: bool) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(destination)
            .await
            .map_err(DownloadError::Io)?;

        for chunk in chunks {
            match &chunk.backend {
                ChunkBackend::Memory { data } => {
                    use tokio::io::AsyncWriteExt;
                    file.write_all(data).await.map_err(DownloadError::Io)?;
                }
                ChunkBackend::TempFile { path } => {
                    let mut src = tokio::fs::File::open(path).await.map_err(DownloadError::Io)?;
                    tokio::io::copy(&mut src, &mut file)
                        .await
                        .map_err(DownloadError::Io)?;
                }
            }
        }
        debug!("sequential merge complete: {} chunks", chunks.len());
        if cleanup_temp_files {
            Self::cleanup_temp_files(chunks).await;
        }
        Ok(())
    }

    async fn merge_mmap(destination: &Path, chunks: &[Chunk], total_size: u64, cleanup_temp_files: bool) -> Result<()> {
        let dest = destination.to_path_buf();
        let chunk_sources: Vec<ChunkSource> = chunks
            .iter()
            .map(|c| match &c.backend {
                ChunkBackend::Memory { data } => ChunkSource::Memory(data.clone()),
                ChunkBackend::TempFile { path } => ChunkSource::TempFile(path.clone()),
            })
            .collect();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .read(true)
                .open(&dest)
                .map_err(DownloadError::Io)?;
            file.set_len(total_size).map_err(DownloadError::Io)?;

            let mut mmap = unsafe { MmapMut::map_mut(&file).map_err(DownloadError::Io)? };

            let mut offset = 0usize;
            for source in chunk_sources {
                match source {
                    ChunkSource::Memory(data) => {
                        mmap[offset..offset + data.len()].copy_from_slice(&data);
                        offset += data.len();
                    }
                    ChunkSource::TempFile(path) => {
                        let bytes = std::fs::read(&path).map_err(DownloadError::Io)?;
                        mmap[offset..offset + bytes.len()].copy_from_slice(&bytes);
                        offset += bytes.len();
                    }
                }
            }

            mmap.flush().map_err(DownloadError::Io)?;
            info!("memory-mapped merge complete: {} bytes", total_size);
            Ok(())
        })
        .await
        .map_err(|e| DownloadError::fatal(0, format!("merge task panicked: {e}")))??;

        if cleanup_temp_files {
            Self::cleanup_temp_files(chunks).await;
        }
        Ok(())
    }

    async fn cleanup_temp_files(chunks: &[Chunk]) {
        for chunk in chunks {
            if let ChunkBackend::TempFile { path } = &chunk.backend {
                let _ = tokio::fs::remove_file(path).await;
            }
        }
    }
}

enum ChunkSource {
    Memory(Vec<u8>),
    TempFile(std::path::PathBuf),
}
