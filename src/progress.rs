// Licensed under the MIT License

//! Progress aggregation: per-chunk events fire unconditionally, while the
//! overall byte count / speed sample is rate-limited to a ≥1s cadence.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::constants::PROGRESS_SAMPLE_INTERVAL;

/// A point-in-time copy of the aggregate download state, attached to the
/// terminal [`ProgressEvent::Completed`] event per spec §4.6.
#[derive(Debug, Clone)]
pub struct PackageSnapshot {
    pub destination: PathBuf,
    pub total_size: u64,
    pub bytes_received: u64,
}

/// Progress/completion events observers may register for.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Fired unconditionally on every chunk update; never rate-limited.
    ChunkProgress {
        chunk_id: u64,
        length: u64,
        position: u64,
        speed: f64,
    },
    /// Fired at most once per [`PROGRESS_SAMPLE_INTERVAL`].
    OverallProgress {
        total_size: u64,
        bytes_received: u64,
        speed: f64,
    },
    /// Fired exactly once, terminating the download.
    Completed {
        cancelled: bool,
        error: Option<String>,
        package: PackageSnapshot,
    },
}

pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

struct SampleState {
    total_bytes_at_last_sample: u64,
    tick_at_last_sample: Instant,
    download_speed: f64,
}

/// Aggregates per-chunk byte counts into overall progress/speed, and fans
/// events out to a registered callback.
pub struct ProgressTracker {
    total_size: u64,
    bytes_received: AtomicU64,
    sample: RwLock<SampleState>,
    chunk_started: RwLock<HashMap<u64, Instant>>,
    callback: RwLock<Option<ProgressCallback>>,
    progress_bar: Option<ProgressBar>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("total_size", &self.total_size)
            .field("bytes_received", &self.bytes_received.load(Ordering::Relaxed))
            .finish()
    }
}

impl ProgressTracker {
    pub fn new(total_size: u64) -> Self {
        Self {
            total_size,
            bytes_received: AtomicU64::new(0),
            sample: RwLock::new(SampleState {
                total_bytes_at_last_sample: 0,
                tick_at_last_sample: Instant::now(),
                download_speed: 0.0,
            }),
            chunk_started: RwLock::new(HashMap::new()),
            callback: RwLock::new(None),
            progress_bar: None,
        }
    }

    /// Create a tracker with an attached console progress bar.
    pub fn with_progress_bar(total_size: u64) -> Self {
        let bar = ProgressBar::new(total_size);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                .unwrap()
                .progress_chars("#>-"),
        );
        Self {
            progress_bar: Some(bar),
            ..Self::new(total_size)
        }
    }

    pub async fn set_callback<F>(&self, callback: F)
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        *self.callback.write().await = Some(Box::new(callback));
    }

    /// Like [`Self::set_callback`], but for a callback that's already boxed
    /// (e.g. one threaded through from a caller that doesn't know the
    /// tracker's concrete type).
    pub async fn set_callback_boxed(&self, callback: ProgressCallback) {
        *self.callback.write().await = Some(callback);
    }

    /// Report `n` newly-written bytes for `chunk_id` (whose total length is
    /// `length`, now at `position`). Always emits `ChunkProgress`, and
    /// emits `OverallProgress` only if at least one second has elapsed
    /// since the last overall sample (§4.6).
    pub async fn record_chunk_progress(&self, chunk_id: u64, length: u64, position: u64, n: u64) {
        let bytes_received = self.bytes_received.fetch_add(n, Ordering::AcqRel) + n;

        if let Some(bar) = &self.progress_bar {
            bar.set_position(bytes_received);
        }

        let chunk_speed = {
            let mut started = self.chunk_started.write().await;
            let start = *started.entry(chunk_id).or_insert_with(Instant::now);
            let elapsed = start.elapsed() + Duration::from_millis(1);
            position as f64 * 1000.0 / elapsed.as_millis() as f64
        };

        self.emit(ProgressEvent::ChunkProgress {
            chunk_id,
            length,
            position,
            speed: chunk_speed,
        })
        .await;

        let mut sample = self.sample.write().await;
        let elapsed = sample.tick_at_last_sample.elapsed() + Duration::from_millis(1);
        if elapsed >= PROGRESS_SAMPLE_INTERVAL {
            let delta = bytes_received.saturating_sub(sample.total_bytes_at_last_sample);
            sample.download_speed = delta as f64 * 1000.0 / elapsed.as_millis() as f64;
            sample.total_bytes_at_last_sample = bytes_received;
            sample.tick_at_last_sample = Instant::now();

            let speed = sample.download_speed;
            drop(sample);

            self.emit(ProgressEvent::OverallProgress {
                total_size: self.total_size,
                bytes_received,
                speed,
            })
            .await;
        }
    }

    pub async fn complete(&self, cancelled: bool, error: Option<String>, package: PackageSnapshot) {
        if let Some(bar) = &self.progress_bar {
            if cancelled {
                bar.abandon_with_message("download cancelled");
            } else if error.is_some() {
                bar.abandon_with_message("download failed");
            } else {
                bar.finish_with_message("download completed");
            }
        }
        self.emit(ProgressEvent::Completed { cancelled, error, package }).await;
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Acquire)
    }

    async fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = self.callback.read().await.as_ref() {
            callback(event);
        }
    }
}

/// A `ProgressTracker` shared across all chunk fetchers for one download.
pub type SharedProgressTracker = Arc<ProgressTracker>;

/// Default console callback, printing one line per `OverallProgress` event.
pub struct ConsoleProgressReporter;

impl ConsoleProgressReporter {
    pub fn default_callback() -> ProgressCallback {
        Box::new(|event: ProgressEvent| {
            if let ProgressEvent::OverallProgress {
                total_size,
                bytes_received,
                speed,
            } = event
            {
                let percentage = if total_size > 0 {
                    bytes_received as f64 / total_size as f64 * 100.0
                } else {
                    0.0
                };
                println!(
                    "Progress: {percentage:.1}% ({bytes_received}/{total_size} bytes) - {} B/s",
                    speed as u64
                );
            }
        })
    }
}
