// Licensed under the MIT License
// Copyright (c) 2025 Hal <hal.long@outlook.com>

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chunked_downloader::{CancellationToken, Chunk, ChunkFetcher, DownloadConfig, FetchOutcome, HttpRequestAdapter, ProgressTracker};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `reqwest::Client::new()` panics under the `rustls-no-provider` feature
/// unless a crypto provider has been installed; the crate normally does
/// this inside `http::shared_client()`/`http::client_with_timeout()`, but
/// these tests build bare clients directly.
fn test_client() -> reqwest::Client {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
    reqwest::Client::new()
}

#[tokio::test]
async fn completes_a_chunk_in_a_single_attempt() {
    let server = MockServer::start().await;
    let body = vec![7u8; 256];

    Mock::given(method("GET"))
        .and(path("/f.bin"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let client = test_client();
    let adapter = HttpRequestAdapter::new(client, format!("{}/f.bin", server.uri()));
    let config = DownloadConfig::default();
    let progress = Arc::new(ProgressTracker::new(256));

    let fetcher = ChunkFetcher::new(&adapter, &config, &progress);
    let mut chunk = Chunk::new_in_memory(0, 0, 255, 3);

    let outcome = fetcher.fetch(&mut chunk, &CancellationToken::new()).await;

    assert!(matches!(outcome, FetchOutcome::Completed));
    assert!(chunk.is_complete());
}

#[tokio::test]
async fn recovers_from_a_transient_server_error_and_completes() {
    let server = MockServer::start().await;
    let body = vec![9u8; 128];

    Mock::given(method("GET"))
        .and(path("/flaky.bin"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky.bin"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let client = test_client();
    let adapter = HttpRequestAdapter::new(client, format!("{}/flaky.bin", server.uri()));
    let config = DownloadConfig {
        timeout_ms: 200,
        ..DownloadConfig::default()
    };
    let progress = Arc::new(ProgressTracker::new(128));

    let fetcher = ChunkFetcher::new(&adapter, &config, &progress);
    let mut chunk = Chunk::new_in_memory(0, 0, 127, 3);

    let outcome = fetcher.fetch(&mut chunk, &CancellationToken::new()).await;

    assert!(matches!(outcome, FetchOutcome::Completed));
    assert_eq!(chunk.failover_count, 1);
}

#[tokio::test]
async fn exhausting_the_retry_budget_surfaces_a_permanent_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/always-down.bin"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client();
    let adapter = HttpRequestAdapter::new(client, format!("{}/always-down.bin", server.uri()));
    let config = DownloadConfig {
        timeout_ms: 100,
        ..DownloadConfig::default()
    };
    let progress = Arc::new(ProgressTracker::new(64));

    let fetcher = ChunkFetcher::new(&adapter, &config, &progress);
    let mut chunk = Chunk::new_in_memory(0, 0, 63, 1);

    let outcome = fetcher.fetch(&mut chunk, &CancellationToken::new()).await;

    assert!(matches!(outcome, FetchOutcome::PermanentError(_)));
}

#[tokio::test]
async fn a_client_error_is_fatal_without_consuming_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.bin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client();
    let adapter = HttpRequestAdapter::new(client, format!("{}/missing.bin", server.uri()));
    let config = DownloadConfig::default();
    let progress = Arc::new(ProgressTracker::new(64));

    let fetcher = ChunkFetcher::new(&adapter, &config, &progress);
    let mut chunk = Chunk::new_in_memory(0, 0, 63, 3);

    let outcome = fetcher.fetch(&mut chunk, &CancellationToken::new()).await;

    assert!(matches!(outcome, FetchOutcome::PermanentError(_)));
    assert_eq!(chunk.failover_count, 0);
}

#[tokio::test]
async fn a_truncated_body_is_treated_as_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/short.bin"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(vec![1u8; 32]))
        .mount(&server)
        .await;

    let client = test_client();
    let adapter = HttpRequestAdapter::new(client, format!("{}/short.bin", server.uri()));
    let config = DownloadConfig::default();
    let progress = Arc::new(ProgressTracker::new(64));

    let fetcher = ChunkFetcher::new(&adapter, &config, &progress);
    let mut chunk = Chunk::new_in_memory(0, 0, 63, 3);

    let outcome = fetcher.fetch(&mut chunk, &CancellationToken::new()).await;

    assert!(matches!(outcome, FetchOutcome::PermanentError(_)));
}

#[tokio::test]
async fn a_buffer_block_size_smaller_than_the_body_still_completes_without_panicking() {
    let server = MockServer::start().await;
    let body = vec![5u8; 300];

    Mock::given(method("GET"))
        .and(path("/oversized-read.bin"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let client = test_client();
    let adapter = HttpRequestAdapter::new(client, format!("{}/oversized-read.bin", server.uri()));
    let config = DownloadConfig {
        buffer_block_size: 32,
        ..DownloadConfig::default()
    };
    let progress = Arc::new(ProgressTracker::new(300));

    let fetcher = ChunkFetcher::new(&adapter, &config, &progress);
    let mut chunk = Chunk::new_in_memory(0, 0, 299, 3);

    let outcome = fetcher.fetch(&mut chunk, &CancellationToken::new()).await;

    assert!(matches!(outcome, FetchOutcome::Completed));
    assert!(chunk.is_complete());
}

#[tokio::test]
async fn a_server_that_ignores_range_and_returns_200_is_fatal() {
    let server = MockServer::start().await;
    let body = vec![1u8; 64];

    Mock::given(method("GET"))
        .and(path("/ignores-range.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;

    let client = test_client();
    let adapter = HttpRequestAdapter::new(client, format!("{}/ignores-range.bin", server.uri()));
    let config = DownloadConfig::default();
    let progress = Arc::new(ProgressTracker::new(64));

    let fetcher = ChunkFetcher::new(&adapter, &config, &progress);
    let mut chunk = Chunk::new_in_memory(0, 0, 63, 3);

    let outcome = fetcher.fetch(&mut chunk, &CancellationToken::new()).await;

    assert!(matches!(outcome, FetchOutcome::PermanentError(_)));
}

#[tokio::test]
async fn a_pre_cancelled_token_short_circuits_before_any_request() {
    let server = MockServer::start().await;
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();

    Mock::given(method("GET"))
        .and(path("/f.bin"))
        .respond_with(move |_: &wiremock::Request| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(206).set_body_bytes(vec![0u8; 16])
        })
        .mount(&server)
        .await;

    let client = test_client();
    let adapter = HttpRequestAdapter::new(client, format!("{}/f.bin", server.uri()));
    let config = DownloadConfig::default();
    let progress = Arc::new(ProgressTracker::new(16));

    let cancel = CancellationToken::new();
    cancel.cancel();

    let fetcher = ChunkFetcher::new(&adapter, &config, &progress);
    let mut chunk = Chunk::new_in_memory(0, 0, 15, 3);

    let outcome = fetcher.fetch(&mut chunk, &cancel).await;

    assert!(matches!(outcome, FetchOutcome::Cancelled));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
