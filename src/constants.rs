// Licensed under the MIT License

//! Centralized constants for the chunked-downloader library.
//! This module eliminates magic numbers and provides a single source of truth
//! for configurable default values.

use std::time::Duration;

/// Default number of chunks when the caller doesn't specify one.
pub const DEFAULT_CHUNK_COUNT: usize = 4;

/// Default per-chunk retry ceiling.
pub const DEFAULT_MAX_FAILOVER: usize = 3;

/// Retry backoff base: sleep `timeout` ms after a transient error, before
/// retrying. This is the spec's "backoff == timeout" rule (§4.2).
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;

/// Escalation step added to the fetcher-local timeout when a retry makes
/// no progress since the last checkpoint (§4.2).
pub const TIMEOUT_ESCALATION_STEP: Duration = Duration::from_millis(200);

/// Default per-read deadline.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 30_000;

/// Default bytes read per syscall.
pub const DEFAULT_BUFFER_BLOCK_SIZE: usize = 64 * 1024;

/// Largest permitted single chunk, per the spec's 2 GiB clamp (§3, §8).
pub const MAX_CHUNK_SIZE: u64 = (1u64 << 31) - 1;

/// HTTP/2 frame size used when building the shared transport client.
pub const HTTP2_FRAME_SIZE: u32 = 16384;

/// Maximum redirect count the shared transport client will follow.
pub const MAX_REDIRECTS: usize = 10;

/// Minimum interval between `OverallProgress` speed recomputations (§4.6).
pub const PROGRESS_SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

/// Default temp-file name suffix.
pub const DEFAULT_TEMP_FILE_EXTENSION: &str = ".part";
