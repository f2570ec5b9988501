// Licensed under the MIT License

//! Drives one chunk to completion: issues the ranged request, streams
//! bytes through a `ThrottledReader`, checkpoints on error, and retries
//! with backoff up to the chunk's failover budget.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::chunk::{Chunk, ChunkBackend};
use crate::config::DownloadConfig;
use crate::constants::TIMEOUT_ESCALATION_STEP;
use crate::error::{DownloadError, Result};
use crate::progress::SharedProgressTracker;
use crate::request_adapter::RequestAdapter;
use crate::throttle::ThrottledReader;

/// Outcome of driving one chunk to completion.
#[derive(Debug)]
pub enum FetchOutcome {
    Completed,
    Cancelled,
    PermanentError(DownloadError),
}

/// A cooperative cancellation flag shared by all of one download's
/// fetchers and pending delays.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ChunkFetcher<'a, A: RequestAdapter> {
    adapter: &'a A,
    config: &'a DownloadConfig,
    progress: &'a SharedProgressTracker,
}

impl<'a, A: RequestAdapter> ChunkFetcher<'a, A> {
    pub fn new(adapter: &'a A, config: &'a DownloadConfig, progress: &'a SharedProgressTracker) -> Self {
        Self {
            adapter,
            config,
            progress,
        }
    }

    /// Drive `chunk` to completion, looping over retries instead of
    /// recursing so pathological retry storms don't grow the stack.
    pub async fn fetch(&self, chunk: &mut Chunk, cancel: &CancellationToken) -> FetchOutcome {
        if cancel.is_cancelled() {
            return FetchOutcome::Cancelled;
        }
        if chunk.is_complete() {
            return FetchOutcome::Completed;
        }
        if chunk.position > 0 && !self.backend_has_data(chunk).await {
            chunk.position = 0;
        }

        let mut local_timeout = self.config.timeout();

        loop {
            if cancel.is_cancelled() {
                return FetchOutcome::Cancelled;
            }

            match self.attempt(chunk, cancel, local_timeout).await {
                Ok(()) => return FetchOutcome::Completed,
                Err(AttemptError::Cancelled) => return FetchOutcome::Cancelled,
                Err(AttemptError::ReadTimeout) => {
                    // A deadline hit is a continuation, not a failover: retry
                    // immediately without consuming the retry budget.
                    debug!(chunk_id = chunk.id, "read deadline elapsed, retrying");
                    continue;
                }
                Err(AttemptError::Fatal(cause)) => return FetchOutcome::PermanentError(cause),
                Err(AttemptError::Transient(cause)) => {
                    if chunk.failover_count >= chunk.max_failover {
                        return FetchOutcome::PermanentError(DownloadError::fatal(
                            chunk.id,
                            format!("retry budget exhausted: {cause}"),
                        ));
                    }

                    let made_progress = chunk.made_progress_since_checkpoint();
                    chunk.checkpoint();
                    chunk.failover_count += 1;

                    if !made_progress {
                        local_timeout += TIMEOUT_ESCALATION_STEP;
                    }

                    warn!(
                        chunk_id = chunk.id,
                        attempt = chunk.failover_count,
                        "transient error, retrying: {cause}"
                    );
                    tokio::time::sleep(local_timeout).await;
                }
            }
        }
    }

    async fn backend_has_data(&self, chunk: &Chunk) -> bool {
        match &chunk.backend {
            ChunkBackend::Memory { data } => !data.is_empty(),
            ChunkBackend::TempFile { path } => tokio::fs::metadata(path).await.is_ok(),
        }
    }

    async fn attempt(
        &self,
        chunk: &mut Chunk,
        cancel: &CancellationToken,
        read_timeout: Duration,
    ) -> std::result::Result<(), AttemptError> {
        let range_start = chunk.start + chunk.position;
        let mut stream = self
            .adapter
            .open_range(range_start, chunk.end)
            .await
            .map_err(classify)?;

        let mut throttle = ThrottledReader::new(self.config.maximum_speed_per_chunk);
        let length = chunk.length();

        match &mut chunk.backend {
            ChunkBackend::Memory { data } => {
                if data.is_empty() {
                    data.resize(length as usize, 0);
                }
                while chunk.position < length {
                    if cancel.is_cancelled() {
                        return Err(AttemptError::Cancelled);
                    }

                    let next = tokio::time::timeout(read_timeout, stream.next())
                        .await
                        .map_err(|_| AttemptError::ReadTimeout)?;

                    match next {
                        Some(Ok(bytes)) => {
                            let mut offset = 0usize;
                            while offset < bytes.len() {
                                if cancel.is_cancelled() {
                                    return Err(AttemptError::Cancelled);
                                }
                                let remaining = length - chunk.position;
                                if remaining == 0 {
                                    return Err(AttemptError::Fatal(DownloadError::fatal(
                                        chunk.id,
                                        format!("server sent more than {length} bytes for this range"),
                                    )));
                                }
                                let take = (remaining as usize)
                                    .min(self.config.buffer_block_size)
                                    .min(bytes.len() - offset);
                                let start = chunk.position as usize;
                                data[start..start + take].copy_from_slice(&bytes[offset..offset + take]);
                                chunk.position += take as u64;
                                offset += take;
                                throttle.throttle(take).await;
                                self.progress
                                    .record_chunk_progress(chunk.id, length, chunk.position, take as u64)
                                    .await;
                            }
                        }
                        Some(Err(e)) => return Err(classify(e.into())),
                        None => break,
                    }
                }
            }
            ChunkBackend::TempFile { path } => {
                if chunk.position == 0 {
                    let name = format!("{}{}", Uuid::new_v4().simple(), self.config.temp_files_extension);
                    *path = self.config.temp_directory.join(name);
                }

                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await
                    .map_err(|e| AttemptError::Fatal(DownloadError::Io(e)))?;

                while chunk.position < length {
                    if cancel.is_cancelled() {
                        return Err(AttemptError::Cancelled);
                    }

                    let next = tokio::time::timeout(read_timeout, stream.next())
                        .await
                        .map_err(|_| AttemptError::ReadTimeout)?;

                    match next {
                        Some(Ok(bytes)) => {
                            let mut offset = 0usize;
                            while offset < bytes.len() {
                                if cancel.is_cancelled() {
                                    return Err(AttemptError::Cancelled);
                                }
                                let remaining = length - chunk.position;
                                if remaining == 0 {
                                    return Err(AttemptError::Fatal(DownloadError::fatal(
                                        chunk.id,
                                        format!("server sent more than {length} bytes for this range"),
                                    )));
                                }
                                let take = (remaining as usize)
                                    .min(self.config.buffer_block_size)
                                    .min(bytes.len() - offset);
                                file.write_all(&bytes[offset..offset + take])
                                    .await
                                    .map_err(|e| AttemptError::Fatal(DownloadError::Io(e)))?;
                                chunk.position += take as u64;
                                offset += take;
                                throttle.throttle(take).await;
                                self.progress
                                    .record_chunk_progress(chunk.id, length, chunk.position, take as u64)
                                    .await;
                            }
                        }
                        Some(Err(e)) => return Err(classify(e.into())),
                        None => break,
                    }
                }
            }
        }

        if chunk.position < length {
            // Server ignored Range or truncated the body: not retried
            // indefinitely, treated as fatal.
            return Err(AttemptError::Fatal(DownloadError::fatal(
                chunk.id,
                format!("stream ended at {} of {} bytes", chunk.position, length),
            )));
        }

        Ok(())
    }
}

enum AttemptError {
    Cancelled,
    ReadTimeout,
    Transient(DownloadError),
    Fatal(DownloadError),
}

fn classify(err: DownloadError) -> AttemptError {
    if err.is_retryable() {
        AttemptError::Transient(err)
    } else {
        AttemptError::Fatal(err)
    }
}
