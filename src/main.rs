// Licensed under the MIT License
// Copyright (c) 2025 Hal <hal.long@outlook.com>

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use chunked_downloader::{
    CancellationToken, ConsoleProgressReporter, DownloadConfig, DownloadOrchestrator,
    HttpRequestAdapter,
};

#[derive(Parser)]
#[command(name = "chunked-downloader")]
#[command(about = "Multi-connection HTTP(S) chunked file downloader")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a file over one or more byte-range chunks
    #[command(alias = "dl")]
    Download {
        /// URL to download
        url: String,
        /// Destination file, or a directory to download into; defaults to
        /// the current directory, naming the file from Content-Disposition
        /// or the URL's last path segment
        destination: Option<PathBuf>,
        /// Number of chunks to split the download into
        #[arg(long, default_value_t = 4)]
        chunks: usize,
        /// Fetch chunks one at a time instead of concurrently
        #[arg(long)]
        serial: bool,
        /// Buffer chunks in memory instead of on-disk temp files
        #[arg(long)]
        on_the_fly: bool,
        /// Per-chunk throughput cap in bytes/second (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        max_speed: u64,
        /// Bytes read per syscall
        #[arg(long, default_value_t = 65536)]
        buffer_size: usize,
        /// Per-read timeout in milliseconds
        #[arg(long, default_value_t = 30_000)]
        timeout_ms: u64,
        /// Per-chunk retry ceiling before giving up
        #[arg(long, default_value_t = 3)]
        max_retries: usize,
        /// Directory for on-disk chunk temp files
        #[arg(long)]
        temp_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    chunked_downloader::logging::init_cli_logging(cli.verbose);

    match cli.command {
        Commands::Download {
            url,
            destination,
            chunks,
            serial,
            on_the_fly,
            max_speed,
            buffer_size,
            timeout_ms,
            max_retries,
            temp_dir,
        } => {
            let mut config = DownloadConfig {
                chunk_count: chunks,
                parallel_download: !serial,
                on_the_fly_download: on_the_fly,
                maximum_speed_per_chunk: max_speed,
                buffer_block_size: buffer_size,
                timeout_ms,
                max_try_again_on_failover: max_retries,
                ..DownloadConfig::default()
            };
            if let Some(dir) = temp_dir {
                config.temp_directory = dir;
            }
            config.validate()?;

            let client = chunked_downloader::http::shared_client().clone();
            let adapter = HttpRequestAdapter::new(client, url.clone());
            let orchestrator = DownloadOrchestrator::new(adapter, config);
            let cancel = CancellationToken::new();
            let on_progress = Some(ConsoleProgressReporter::default_callback());

            // With no destination (or an existing directory), the filename
            // is resolved from Content-Disposition / the URL instead.
            let summary = match destination {
                Some(path) if path.is_dir() => {
                    orchestrator.download_to_folder(&path, on_progress, cancel).await?
                }
                Some(path) => orchestrator.download(&path, on_progress, cancel).await?,
                None => orchestrator.download_to_folder(Path::new("."), on_progress, cancel).await?,
            };

            if summary.cancelled {
                println!("download cancelled");
            } else {
                println!(
                    "downloaded {} bytes to {}",
                    summary.total_size,
                    summary.destination.display()
                );
            }
        }
    }

    Ok(())
}
