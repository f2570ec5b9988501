// Licensed under the MIT License

//! Deterministic tiling of a resource's byte range into chunks.
//!
//! Adapted from the chunk-size calculation in a concurrent downloader that
//! previously also factored in live transfer speed; that adaptive branch is
//! deliberately not carried over here; this planner is a pure function of
//! its two inputs.

use crate::constants::MAX_CHUNK_SIZE;

/// One planned byte range, before any `Chunk` storage is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedRange {
    pub start: u64,
    pub end: u64,
}

impl PlannedRange {
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Partitions `[0, total_size)` into chunks.
pub struct ChunkPlanner;

impl ChunkPlanner {
    /// Plan chunk boundaries for a resource of `total_size` bytes, aiming
    /// for `requested_parts` chunks (coerced to at least 1).
    ///
    /// `parts` is raised if needed so that no chunk exceeds
    /// [`MAX_CHUNK_SIZE`] (the spec's 2 GiB clamp).
    pub fn plan(total_size: u64, requested_parts: usize) -> Vec<PlannedRange> {
        assert!(total_size > 0, "total_size must be positive");

        let min_parts_for_size_bound = total_size.div_ceil(MAX_CHUNK_SIZE).max(1) as usize;
        let parts = requested_parts.max(1).max(min_parts_for_size_bound);

        let mut chunk_size = total_size / parts as u64;
        let mut parts = parts;
        if chunk_size < 1 {
            chunk_size = 1;
            parts = total_size as usize;
        }

        let mut ranges = Vec::with_capacity(parts);
        for i in 0..parts {
            let start = i as u64 * chunk_size;
            let end = if i == parts - 1 {
                total_size - 1
            } else {
                start + chunk_size - 1
            };
            ranges.push(PlannedRange { start, end });
        }
        ranges
    }
}
