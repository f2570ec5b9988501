// Licensed under the MIT License
// Copyright (c) 2025 Hal <hal.long@outlook.com>

//! # Chunked Downloader
//!
//! Multi-connection HTTP(S) file downloader: splits a resource into
//! byte-range chunks, fetches them in parallel or serially with
//! per-chunk retry and throttling, and merges the results into a single
//! destination file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chunked_downloader::{DownloadConfig, DownloadOrchestrator, HttpRequestAdapter, CancellationToken};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> chunked_downloader::Result<()> {
//!     let client = chunked_downloader::http::shared_client().clone();
//!     let adapter = HttpRequestAdapter::new(client, "https://example.com/archive.zip");
//!     let orchestrator = DownloadOrchestrator::new(adapter, DownloadConfig::default());
//!     let summary = orchestrator
//!         .download(Path::new("archive.zip"), None, CancellationToken::new())
//!         .await?;
//!     println!("downloaded {} bytes to {}", summary.total_size, summary.destination.display());
//!     Ok(())
//! }
//! ```

pub mod chunk;
pub mod chunk_fetcher;
pub mod chunk_planner;
pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod logging;
pub mod merger;
pub mod orchestrator;
pub mod package;
pub mod progress;
pub mod request_adapter;
pub mod throttle;

pub use chunk::{Chunk, ChunkBackend};
pub use chunk_fetcher::{CancellationToken, ChunkFetcher, FetchOutcome};
pub use chunk_planner::{ChunkPlanner, PlannedRange};
pub use config::{DownloadConfig, GeneralConfig};
pub use error::{DownloadError, Result};
pub use merger::Merger;
pub use orchestrator::{DownloadOrchestrator, DownloadSummary};
pub use package::Package;
pub use progress::{ConsoleProgressReporter, PackageSnapshot, ProgressEvent, ProgressTracker, SharedProgressTracker};
pub use request_adapter::{HttpRequestAdapter, RequestAdapter, ResourceInfo};
pub use throttle::ThrottledReader;
