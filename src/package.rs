// Licensed under the MIT License

//! The aggregate state of one download: address, destination, chunks, and
//! the running byte counter, bundled for the lifetime of a single
//! orchestrator run.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::chunk::Chunk;
use crate::config::DownloadConfig;

/// Aggregate state for one download, created at the orchestrator's entry
/// point and discarded on completion, cancellation, or error.
pub struct Package {
    pub address: String,
    pub destination: PathBuf,
    pub total_size: u64,
    pub chunks: Vec<Chunk>,
    pub bytes_received: AtomicU64,
    pub config: DownloadConfig,
}

impl Package {
    pub fn new(address: String, destination: PathBuf, total_size: u64, chunks: Vec<Chunk>, config: DownloadConfig) -> Self {
        Self {
            address,
            destination,
            total_size,
            chunks,
            bytes_received: AtomicU64::new(0),
            config,
        }
    }

    pub fn add_bytes_received(&self, n: u64) -> u64 {
        self.bytes_received.fetch_add(n, Ordering::AcqRel) + n
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Acquire)
    }
}
