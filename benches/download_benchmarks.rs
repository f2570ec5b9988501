// Licensed under the MIT License
// Copyright (c) 2025 Hal <hal.long@outlook.com>

//! Performance benchmarks for chunked-downloader.
//!
//! Run with: `cargo bench --bench download_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use chunked_downloader::{Chunk, ChunkPlanner, DownloadConfig, Merger, ThrottledReader};

// ============================================================================
// Chunk Planning Benchmarks
// ============================================================================

fn bench_chunk_planner(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_planner");

    for &(total_size, parts) in &[
        (1024u64, 1usize),
        (1024 * 1024, 8),
        (1024 * 1024 * 1024, 16),
        (5u64 * 1024 * 1024 * 1024, 4),
    ] {
        group.bench_with_input(
            BenchmarkId::new("plan", format!("{total_size}/{parts}")),
            &(total_size, parts),
            |b, &(total_size, parts)| {
                b.iter(|| black_box(ChunkPlanner::plan(total_size, parts)));
            },
        );
    }

    group.finish();
}

// ============================================================================
// Throttle Benchmarks
// ============================================================================

fn bench_throttle(c: &mut Criterion) {
    c.bench_function("throttle_record_and_delay_unlimited", |b| {
        let mut reader = ThrottledReader::new(0);
        b.iter(|| black_box(reader.record_and_delay(black_box(65536))));
    });

    c.bench_function("throttle_record_and_delay_capped", |b| {
        let mut reader = ThrottledReader::new(10 * 1024 * 1024);
        b.iter(|| black_box(reader.record_and_delay(black_box(4096))));
    });
}

// ============================================================================
// Config Benchmarks
// ============================================================================

fn bench_config(c: &mut Criterion) {
    let mut group = c.benchmark_group("config");

    group.bench_function("default", |b| {
        b.iter(|| black_box(DownloadConfig::default()));
    });

    group.bench_function("validate", |b| {
        let config = DownloadConfig::default();
        b.iter(|| black_box(config.validate()));
    });

    group.finish();
}

// ============================================================================
// Merge Throughput Benchmarks
// ============================================================================

fn bench_merge(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("merge");

    for size in [64 * 1024usize, 1024 * 1024, 16 * 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("in_memory_chunks", size), &size, |b, &size| {
            b.to_async(&rt).iter(|| async move {
                let dir = tempfile::tempdir().unwrap();
                let dest = dir.path().join("out.bin");

                let chunk_count = 4;
                let chunk_len = size as u64 / chunk_count;
                let mut chunks = Vec::new();
                for i in 0..chunk_count {
                    let start = i * chunk_len;
                    let end = if i == chunk_count - 1 { size as u64 - 1 } else { start + chunk_len - 1 };
                    let mut chunk = Chunk::new_in_memory(i, start, end, 3);
                    let data = vec![0u8; (end - start + 1) as usize];
                    chunk.backend = chunked_downloader::ChunkBackend::Memory { data };
                    chunk.position = end - start + 1;
                    chunks.push(chunk);
                }

                let _ = black_box(Merger::merge(&dest, &chunks, size as u64, true).await);
            });
        });
    }

    group.finish();
}

criterion_group!(
    name = planning_benches;
    config = Criterion::default().sample_size(100);
    targets = bench_chunk_planner, bench_throttle, bench_config
);

criterion_group!(
    name = merge_benches;
    config = Criterion::default().sample_size(20);
    targets = bench_merge
);

criterion_main!(planning_benches, merge_benches);
