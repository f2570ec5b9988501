// Licensed under the MIT License

//! Drives a single download end to end: pre-flight checks, chunk planning,
//! parallel or serial fetch dispatch, merge, and the terminal `Completed`
//! event.
//!
//! Adapted from a concurrent downloader's per-URL retry loop and
//! semaphore-bounded chunk spawn, generalized from "try the N best
//! mirrors" down to "fetch N byte-range chunks of one resource".

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::chunk::Chunk;
use crate::chunk_fetcher::{CancellationToken, ChunkFetcher, FetchOutcome};
use crate::chunk_planner::ChunkPlanner;
use crate::config::DownloadConfig;
use crate::error::{DownloadError, Result};
use crate::merger::Merger;
use crate::package::Package;
use crate::progress::{PackageSnapshot, ProgressCallback, ProgressTracker, SharedProgressTracker};
use crate::request_adapter::{RequestAdapter, ResourceInfo};

/// Summary returned once a download pipeline finishes (successfully,
/// cancelled, or with a fatal error already propagated via `Err`).
#[derive(Debug)]
pub struct DownloadSummary {
    pub destination: PathBuf,
    pub total_size: u64,
    pub cancelled: bool,
}

pub struct DownloadOrchestrator<A: RequestAdapter> {
    adapter: A,
    config: DownloadConfig,
}

impl<A: RequestAdapter> DownloadOrchestrator<A> {
    pub fn new(adapter: A, config: DownloadConfig) -> Self {
        Self { adapter, config }
    }

    /// Run the full pipeline against `destination`, invoking `on_progress`
    /// (if supplied) with every progress/completion event. A console
    /// progress bar is always attached to the tracker driving the download.
    pub async fn download(
        &self,
        destination: &Path,
        on_progress: Option<ProgressCallback>,
        cancel: CancellationToken,
    ) -> Result<DownloadSummary> {
        self.config.validate()?;
        let info = self.adapter.get_resource_info().await?;
        self.run(destination, info, on_progress, cancel).await
    }

    /// Like [`Self::download`], but `folder` names a directory rather than
    /// a file: the destination filename is derived from the resource's
    /// `Content-Disposition` header, falling back to the URL's last path
    /// segment.
    pub async fn download_to_folder(
        &self,
        folder: &Path,
        on_progress: Option<ProgressCallback>,
        cancel: CancellationToken,
    ) -> Result<DownloadSummary> {
        self.config.validate()?;
        let info = self.adapter.get_resource_info().await?;
        let file_name = info
            .content_disposition_filename
            .clone()
            .unwrap_or_else(|| self.adapter.file_name());
        tokio::fs::create_dir_all(folder).await.map_err(DownloadError::Io)?;
        let destination = folder.join(file_name);
        self.run(&destination, info, on_progress, cancel).await
    }

    async fn run(
        &self,
        destination: &Path,
        info: ResourceInfo,
        on_progress: Option<ProgressCallback>,
        cancel: CancellationToken,
    ) -> Result<DownloadSummary> {
        if info.total_size == 0 {
            return Err(DownloadError::invalid_resource(
                "resource size is unknown or zero",
            ));
        }
        if !info.supports_range {
            return Err(DownloadError::invalid_resource(
                "resource does not support ranged requests",
            ));
        }

        self.check_disk_space(destination, info.total_size).await?;

        if destination.exists() {
            tokio::fs::remove_file(destination).await.map_err(DownloadError::Io)?;
        }

        let ranges = ChunkPlanner::plan(info.total_size, self.config.chunk_count);
        let chunks: Vec<Chunk> = ranges
            .iter()
            .enumerate()
            .map(|(id, range)| {
                if self.config.on_the_fly_download {
                    Chunk::new_in_memory(id as u64, range.start, range.end, self.config.max_try_again_on_failover)
                } else {
                    Chunk::new_on_disk(
                        id as u64,
                        range.start,
                        range.end,
                        self.config.max_try_again_on_failover,
                        PathBuf::new(),
                    )
                }
            })
            .collect();

        let mut package = Package::new(
            self.adapter.address().to_string(),
            destination.to_path_buf(),
            info.total_size,
            chunks,
            self.config.clone(),
        );

        let progress: SharedProgressTracker = Arc::new(ProgressTracker::with_progress_bar(info.total_size));
        if let Some(callback) = on_progress {
            progress.set_callback_boxed(callback).await;
        }

        info!(
            chunk_count = package.chunks.len(),
            total_size = info.total_size,
            parallel = self.config.parallel_download,
            "starting download"
        );

        let outcome = if self.config.parallel_download {
            self.fetch_parallel(&mut package, &progress, &cancel).await
        } else {
            self.fetch_serial(&mut package, &progress, &cancel).await
        };

        match outcome {
            FetchRunOutcome::Cancelled => {
                progress.complete(true, None, package_snapshot(&package)).await;
                Ok(DownloadSummary {
                    destination: package.destination,
                    total_size: package.total_size,
                    cancelled: true,
                })
            }
            FetchRunOutcome::Fatal(cause) => {
                progress
                    .complete(false, Some(cause.to_string()), package_snapshot(&package))
                    .await;
                Err(cause)
            }
            FetchRunOutcome::Success => {
                Merger::merge(
                    &package.destination,
                    &package.chunks,
                    package.total_size,
                    self.config.clear_package_after_download_completed,
                )
                .await?;
                progress.complete(false, None, package_snapshot(&package)).await;
                Ok(DownloadSummary {
                    destination: package.destination,
                    total_size: package.total_size,
                    cancelled: false,
                })
            }
        }
    }

    async fn fetch_parallel(
        &self,
        package: &mut Package,
        progress: &SharedProgressTracker,
        cancel: &CancellationToken,
    ) -> FetchRunOutcome {
        let max_concurrency = package.chunks.len();
        let semaphore = Arc::new(Semaphore::new(max_concurrency));

        let results = futures_util::future::join_all(package.chunks.iter_mut().map(|chunk| {
            let semaphore = semaphore.clone();
            let fetcher = ChunkFetcher::new(&self.adapter, &self.config, progress);
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore is never closed");
                let length = chunk.length();
                let outcome = fetcher.fetch(chunk, cancel).await;
                (outcome, length)
            }
        }))
        .await;

        self.resolve(package, results)
    }

    async fn fetch_serial(
        &self,
        package: &mut Package,
        progress: &SharedProgressTracker,
        cancel: &CancellationToken,
    ) -> FetchRunOutcome {
        let mut results = Vec::with_capacity(package.chunks.len());
        for chunk in package.chunks.iter_mut() {
            let fetcher = ChunkFetcher::new(&self.adapter, &self.config, progress);
            let length = chunk.length();
            let outcome = fetcher.fetch(chunk, cancel).await;
            let stop_early = matches!(outcome, FetchOutcome::Cancelled | FetchOutcome::PermanentError(_));
            results.push((outcome, length));
            if stop_early {
                break;
            }
        }
        self.resolve(package, results)
    }

    fn resolve(&self, package: &Package, results: Vec<(FetchOutcome, u64)>) -> FetchRunOutcome {
        let mut outcome = FetchRunOutcome::Success;
        for (result, length) in results {
            match result {
                FetchOutcome::Completed => {
                    package.add_bytes_received(length);
                }
                FetchOutcome::Cancelled if matches!(outcome, FetchRunOutcome::Success) => {
                    outcome = FetchRunOutcome::Cancelled;
                }
                FetchOutcome::PermanentError(cause) => {
                    outcome = FetchRunOutcome::Fatal(cause);
                }
                FetchOutcome::Cancelled => {}
            }
        }
        outcome
    }

    async fn check_disk_space(&self, destination: &Path, total_size: u64) -> Result<()> {
        let dest_dir = destination.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        tokio::fs::create_dir_all(&dest_dir).await.map_err(DownloadError::Io)?;

        let temp_dir = self.config.temp_directory.clone();
        let on_the_fly = self.config.on_the_fly_download;
        if !on_the_fly {
            tokio::fs::create_dir_all(&temp_dir).await.map_err(DownloadError::Io)?;
        }

        let dest_dir_for_blocking = dest_dir.clone();
        let temp_dir_for_blocking = temp_dir.clone();
        let (dest_available, temp_available, same_drive) = tokio::task::spawn_blocking(move || {
            let dest_available = fs4::available_space(&dest_dir_for_blocking).unwrap_or(u64::MAX);
            let temp_available = if on_the_fly {
                u64::MAX
            } else {
                fs4::available_space(&temp_dir_for_blocking).unwrap_or(u64::MAX)
            };
            let same_drive = same_filesystem(&dest_dir_for_blocking, &temp_dir_for_blocking);
            (dest_available, temp_available, same_drive)
        })
        .await
        .map_err(|e| DownloadError::fatal(0, format!("disk space check panicked: {e}")))?;

        if dest_available < total_size {
            return Err(DownloadError::insufficient_disk_space(
                dest_dir.display().to_string(),
                total_size,
                dest_available,
            ));
        }

        if !on_the_fly {
            let required = if same_drive { total_size * 2 } else { total_size };
            if temp_available < required {
                return Err(DownloadError::insufficient_disk_space(
                    temp_dir.display().to_string(),
                    required,
                    temp_available,
                ));
            }
        }

        debug!("disk space check passed for {} bytes", total_size);
        Ok(())
    }
}

fn package_snapshot(package: &Package) -> PackageSnapshot {
    PackageSnapshot {
        destination: package.destination.clone(),
        total_size: package.total_size,
        bytes_received: package.bytes_received(),
    }
}

fn same_filesystem(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a.starts_with(&b) || b.starts_with(&a),
        _ => false,
    }
}

enum FetchRunOutcome {
    Success,
    Cancelled,
    Fatal(DownloadError),
}
