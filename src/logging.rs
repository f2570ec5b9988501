// Licensed under the MIT License

//! Structured logging setup for chunked-downloader.
//!
//! This module provides a small set of logging configurations (CLI,
//! library/API, debug, silent) built on `tracing` + `tracing-subscriber`.

use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT_LOGGING: Once = Once::new();

/// Logging mode for different usage contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// CLI mode: clean, user-friendly output.
    Cli,
    /// Library/API mode: structured, compact output on stderr.
    Api,
    /// Debug mode: verbose output with target/file/line.
    Debug,
    /// Silent mode: errors only.
    Silent,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub mode: LoggingMode,
    pub level: String,
    pub show_target: bool,
    pub show_file_line: bool,
    pub use_ansi_colors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::api()
    }
}

impl LoggingConfig {
    /// CLI logging configuration.
    pub fn cli(verbose: bool) -> Self {
        Self {
            mode: LoggingMode::Cli,
            level: if verbose { "info".to_string() } else { "warn".to_string() },
            show_target: verbose,
            show_file_line: verbose,
            use_ansi_colors: true,
        }
    }

    /// Library/API logging configuration.
    pub fn api() -> Self {
        Self {
            mode: LoggingMode::Api,
            level: "warn".to_string(),
            show_target: false,
            show_file_line: false,
            use_ansi_colors: false,
        }
    }

    /// Verbose debug logging configuration.
    pub fn debug() -> Self {
        Self {
            mode: LoggingMode::Debug,
            level: "debug".to_string(),
            show_target: true,
            show_file_line: true,
            use_ansi_colors: true,
        }
    }

    /// Errors-only logging configuration.
    pub fn silent() -> Self {
        Self {
            mode: LoggingMode::Silent,
            level: "error".to_string(),
            show_target: false,
            show_file_line: false,
            use_ansi_colors: false,
        }
    }
}

/// Initialize logging with the given configuration. Idempotent: only the
/// first call in a process takes effect, matching the process-wide
/// transport initialiser in `http.rs`.
pub fn init_logging(config: LoggingConfig) {
    INIT_LOGGING.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("chunked_downloader={}", config.level)));

        let fmt_layer = fmt::layer()
            .with_target(config.show_target)
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_ansi(config.use_ansi_colors)
            .with_writer(std::io::stderr)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();
    });
}

/// Initialize CLI-style logging (convenience function for the binary).
pub fn init_cli_logging(verbose: bool) {
    init_logging(LoggingConfig::cli(verbose));
}

/// Initialize library-style logging (convenience function for tests/hosts
/// that embed the crate without a CLI front-end).
pub fn init_tracing() {
    init_logging(LoggingConfig::api());
}
