// Licensed under the MIT License

//! Process-wide HTTP transport: one idempotently-built `reqwest::Client`
//! shared by every download, plus the rustls crypto provider init that
//! must run before it.

use crate::constants::{HTTP2_FRAME_SIZE, MAX_REDIRECTS};
use crate::error::{DownloadError, Result};
use reqwest::Client;
use std::sync::{Once, OnceLock};
use std::time::Duration;

static INIT_RUSTLS: Once = Once::new();
static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Install the rustls crypto provider (ring backend). Required once before
/// any `reqwest::Client` is built under the `rustls-no-provider` feature.
fn init_rustls_provider() {
    INIT_RUSTLS.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

fn build_client() -> Client {
    init_rustls_provider();

    Client::builder()
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .pool_max_idle_per_host(20)
        .http2_adaptive_window(true)
        .http2_max_frame_size(Some(HTTP2_FRAME_SIZE))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .expect("building the shared HTTP client with static configuration cannot fail")
}

/// The shared, process-wide HTTP client. Built once on first access.
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(build_client)
}

/// Build a client dedicated to one download, honoring a caller-specified
/// per-read timeout. Used instead of [`shared_client`] whenever the
/// configured timeout differs from the shared client's defaults.
pub fn client_with_timeout(timeout: Duration) -> Result<Client> {
    init_rustls_provider();

    Client::builder()
        .timeout(timeout)
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .pool_max_idle_per_host(20)
        .http2_adaptive_window(true)
        .http2_max_frame_size(Some(HTTP2_FRAME_SIZE))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(DownloadError::Network)
}
