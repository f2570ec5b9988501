// Licensed under the MIT License

//! The external contract between the download engine and an HTTP
//! transport: resolve a resource's size/filename, and open ranged byte
//! streams against it.

use crate::error::{DownloadError, Result};
use bytes::Bytes;
use futures_util::Stream;
use reqwest::Client;
use std::pin::Pin;

pub type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Resource metadata resolved from a pre-flight probe.
#[derive(Debug, Clone)]
pub struct ResourceInfo {
    pub total_size: u64,
    pub content_disposition_filename: Option<String>,
    /// Whether the server's `Accept-Ranges` header rules out range support.
    /// `true` unless the header is present and explicitly says `none`; a
    /// server that stays silent on the header is given the benefit of the
    /// doubt here; `open_range` is the actual, authoritative gate (it
    /// requires a literal `206` on every ranged request).
    pub supports_range: bool,
}

/// External collaborator supplying resource size/filename and ranged byte
/// streams. The engine never talks to `reqwest` directly outside this
/// trait's implementation.
pub trait RequestAdapter: Send + Sync {
    /// The absolute URL this adapter fetches from.
    fn address(&self) -> &str;

    /// Probe the resource; returns its size and any `Content-Disposition`
    /// filename. A `0` size or a missing `Content-Length` is surfaced as
    /// [`DownloadError::InvalidResource`] by the caller.
    fn get_resource_info(&self) -> impl std::future::Future<Output = Result<ResourceInfo>> + Send;

    /// URL-derived fallback filename: the last path segment.
    fn file_name(&self) -> String;

    /// Open a ranged byte stream for `[start, end]` (inclusive). Only a
    /// `206` response is treated as success; anything else, including a
    /// `200` that ignored `Range`, is an error.
    fn open_range(
        &self,
        start: u64,
        end: u64,
    ) -> impl std::future::Future<Output = Result<ByteStream>> + Send;
}

/// `reqwest`-backed implementation of [`RequestAdapter`].
#[derive(Debug, Clone)]
pub struct HttpRequestAdapter {
    client: Client,
    url: String,
}

impl HttpRequestAdapter {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl RequestAdapter for HttpRequestAdapter {
    fn address(&self) -> &str {
        &self.url
    }

    async fn get_resource_info(&self) -> Result<ResourceInfo> {
        let response = self
            .client
            .head(&self.url)
            .send()
            .await
            .map_err(DownloadError::Network)?;

        if !response.status().is_success() {
            return Err(DownloadError::from_status_code(
                response.status().as_u16(),
                &self.url,
            ));
        }

        let total_size = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let content_disposition_filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_disposition_filename);

        let supports_range = parse_accept_ranges(
            response
                .headers()
                .get(reqwest::header::ACCEPT_RANGES)
                .and_then(|v| v.to_str().ok()),
        );

        Ok(ResourceInfo {
            total_size,
            content_disposition_filename,
            supports_range,
        })
    }

    fn file_name(&self) -> String {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.path_segments().and_then(|mut s| s.next_back().map(str::to_string)))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "download".to_string())
    }

    async fn open_range(&self, start: u64, end: u64) -> Result<ByteStream> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::RANGE, format!("bytes={start}-{end}"))
            .send()
            .await
            .map_err(DownloadError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::from_status_code(status.as_u16(), &self.url));
        }
        if status.as_u16() != 206 {
            return Err(DownloadError::invalid_resource(format!(
                "server returned {status} instead of 206 Partial Content for a ranged request; \
                 it does not honour Range"
            )));
        }

        Ok(Box::pin(response.bytes_stream()))
    }
}

/// `Accept-Ranges` is advisory: its absence doesn't mean a server can't
/// serve ranges, only an explicit `none` does.
fn parse_accept_ranges(header: Option<&str>) -> bool {
    !header.is_some_and(|v| v.eq_ignore_ascii_case("none"))
}

fn parse_content_disposition_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
}
