// Licensed under the MIT License

use thiserror::Error;

/// Main error type for chunked-downloader operations.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Network-related errors (connection refused, reset, TLS failure, ...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// IO-related errors (temp file creation, merge writes, ...).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A per-read deadline elapsed.
    #[error("read timed out after {0:?}")]
    ReadTimeout(std::time::Duration),

    /// The resource has an unknown or non-positive size, or does not
    /// support ranged requests.
    #[error("invalid resource: {message}")]
    InvalidResource { message: String },

    /// Not enough free space on the destination or temp drive.
    #[error("insufficient disk space on {drive}: need {needed} bytes, have {available} bytes")]
    InsufficientDiskSpace {
        drive: String,
        needed: u64,
        available: u64,
    },

    /// A transient transport-level failure, eligible for retry.
    #[error("transient transport error on chunk {chunk_id}: {message}")]
    TransportTransient { chunk_id: u64, message: String },

    /// HTTP status code errors that are not retryable (4xx, except 429).
    #[error("HTTP {status}: {message} ({url})")]
    HttpStatus {
        status: u16,
        message: String,
        url: String,
    },

    /// The operation was cancelled.
    #[error("download cancelled")]
    Cancelled,

    /// Configuration is invalid.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A chunk exhausted its retry budget, or hit an unrecoverable condition
    /// (e.g. the server ignored the Range header and returned a short body).
    #[error("fatal error on chunk {chunk_id}: {message}")]
    Fatal { chunk_id: u64, message: String },
}

impl DownloadError {
    pub fn invalid_resource<S: Into<String>>(message: S) -> Self {
        Self::InvalidResource {
            message: message.into(),
        }
    }

    pub fn insufficient_disk_space<S: Into<String>>(drive: S, needed: u64, available: u64) -> Self {
        Self::InsufficientDiskSpace {
            drive: drive.into(),
            needed,
            available,
        }
    }

    pub fn transport_transient<S: Into<String>>(chunk_id: u64, message: S) -> Self {
        Self::TransportTransient {
            chunk_id,
            message: message.into(),
        }
    }

    pub fn http_status<S: Into<String>>(status: u16, message: S, url: S) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
            url: url.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn fatal<S: Into<String>>(chunk_id: u64, message: S) -> Self {
        Self::Fatal {
            chunk_id,
            message: message.into(),
        }
    }

    /// Create an error from an HTTP status code observed on a ranged request.
    pub fn from_status_code(status: u16, url: &str) -> Self {
        let message = match status {
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            408 => "Request Timeout",
            416 => "Range Not Satisfiable",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "Unknown Error",
        };

        if status >= 500 || status == 429 {
            Self::TransportTransient {
                chunk_id: 0,
                message: format!("{status} {message} from {url}"),
            }
        } else {
            Self::HttpStatus {
                status,
                message: message.to_string(),
                url: url.to_string(),
            }
        }
    }

    /// Whether a fetcher should retry after this error (consuming one unit
    /// of its failover budget). Read timeouts are handled separately and
    /// never consume the budget (see `ChunkFetcher::fetch`).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DownloadError::Network(_) | DownloadError::Io(_) | DownloadError::TransportTransient { .. }
        )
    }

    /// Error category, useful for logging/metrics.
    pub fn category(&self) -> &'static str {
        match self {
            DownloadError::Network(_) => "network",
            DownloadError::Io(_) => "io",
            DownloadError::InvalidUrl(_) => "url",
            DownloadError::ReadTimeout(_) => "read_timeout",
            DownloadError::InvalidResource { .. } => "invalid_resource",
            DownloadError::InsufficientDiskSpace { .. } => "disk_space",
            DownloadError::TransportTransient { .. } => "transport_transient",
            DownloadError::HttpStatus { .. } => "http_status",
            DownloadError::Cancelled => "cancelled",
            DownloadError::Config { .. } => "config",
            DownloadError::Fatal { .. } => "fatal",
        }
    }
}

/// Result type alias for chunked-downloader operations.
pub type Result<T> = std::result::Result<T, DownloadError>;
