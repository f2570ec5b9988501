// Licensed under the MIT License

//! Download options (the spec's "Options") and a small general wrapper,
//! with defaults, validation, and optional layered loading from a TOML
//! file plus environment variables.

use crate::constants::{
    DEFAULT_BUFFER_BLOCK_SIZE, DEFAULT_CHUNK_COUNT, DEFAULT_MAX_FAILOVER, DEFAULT_READ_TIMEOUT_MS,
    DEFAULT_TEMP_FILE_EXTENSION,
};
use crate::error::{DownloadError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The full set of options governing one download.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Desired number of chunks (clamped up so no chunk exceeds 2 GiB).
    pub chunk_count: usize,
    /// `true`: fetch chunks concurrently. `false`: fetch in plan order.
    pub parallel_download: bool,
    /// `true`: in-memory backend. `false`: on-disk temp files.
    pub on_the_fly_download: bool,
    /// Bytes/second cap per chunk (0 = unlimited).
    pub maximum_speed_per_chunk: u64,
    /// Bytes read per syscall.
    pub buffer_block_size: usize,
    /// Per-read timeout in milliseconds; also the retry backoff base.
    pub timeout_ms: u64,
    /// Per-chunk retry ceiling.
    pub max_try_again_on_failover: usize,
    /// Directory for on-disk backend temp files.
    pub temp_directory: PathBuf,
    /// Suffix appended to temp filenames.
    pub temp_files_extension: String,
    /// Whether to release chunk storage after a successful download.
    pub clear_package_after_download_completed: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_count: DEFAULT_CHUNK_COUNT,
            parallel_download: true,
            on_the_fly_download: false,
            maximum_speed_per_chunk: 0,
            buffer_block_size: DEFAULT_BUFFER_BLOCK_SIZE,
            timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            max_try_again_on_failover: DEFAULT_MAX_FAILOVER,
            temp_directory: std::env::temp_dir(),
            temp_files_extension: DEFAULT_TEMP_FILE_EXTENSION.to_string(),
            clear_package_after_download_completed: true,
        }
    }
}

impl DownloadConfig {
    /// Reject configurations that can never make progress.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_count == 0 {
            return Err(DownloadError::config("chunk_count must be at least 1"));
        }
        if self.buffer_block_size == 0 {
            return Err(DownloadError::config("buffer_block_size must be positive"));
        }
        if self.timeout_ms == 0 {
            return Err(DownloadError::config("timeout_ms must be positive"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    /// Load a config from a TOML file, falling back to defaults for
    /// anything the file doesn't set, then layering `CHUNKED_DOWNLOADER_*`
    /// environment variables on top.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        use figment::providers::{Env, Format, Toml};
        use figment::Figment;

        let mut figment = Figment::from(figment::providers::Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("CHUNKED_DOWNLOADER_"));

        let config: Self = figment
            .extract()
            .map_err(|e| DownloadError::config(format!("failed to load configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &std::path::Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| DownloadError::config(format!("failed to serialize configuration: {e}")))?;
        std::fs::write(path, contents).map_err(DownloadError::Io)
    }
}

/// Process-wide defaults that aren't part of a single download's options:
/// the user agent sent on every request, and the default destination
/// directory used when the caller doesn't specify one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub user_agent: String,
    pub default_download_directory: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("chunked-downloader/{}", env!("CARGO_PKG_VERSION")),
            default_download_directory: dirs::download_dir().unwrap_or_else(std::env::temp_dir),
        }
    }
}
