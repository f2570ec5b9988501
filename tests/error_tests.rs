// Licensed under the MIT License
// Copyright (c) 2025 Hal <hal.long@outlook.com>

use chunked_downloader::DownloadError;

#[test]
fn config_error_is_not_retryable() {
    let error = DownloadError::config("invalid configuration");
    assert_eq!(error.category(), "config");
    assert!(!error.is_retryable());
    assert_eq!(error.to_string(), "configuration error: invalid configuration");
}

#[test]
fn invalid_resource_error_is_not_retryable() {
    let error = DownloadError::invalid_resource("size is unknown");
    assert_eq!(error.category(), "invalid_resource");
    assert!(!error.is_retryable());
}

#[test]
fn insufficient_disk_space_reports_drive_and_amounts() {
    let error = DownloadError::insufficient_disk_space("/tmp", 1000, 500);
    assert_eq!(error.category(), "disk_space");
    assert!(!error.is_retryable());
    assert!(error.to_string().contains("/tmp"));
    assert!(error.to_string().contains("1000"));
}

#[test]
fn transport_transient_error_is_retryable() {
    let error = DownloadError::transport_transient(3, "connection reset");
    assert_eq!(error.category(), "transport_transient");
    assert!(error.is_retryable());
}

#[test]
fn fatal_error_is_not_retryable() {
    let error = DownloadError::fatal(2, "retry budget exhausted");
    assert_eq!(error.category(), "fatal");
    assert!(!error.is_retryable());
}

#[test]
fn cancelled_error_is_not_retryable() {
    let error = DownloadError::Cancelled;
    assert_eq!(error.category(), "cancelled");
    assert!(!error.is_retryable());
}

#[test]
fn io_error_is_retryable() {
    let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
    let error = DownloadError::Io(io_error);
    assert_eq!(error.category(), "io");
    assert!(error.is_retryable());
}

#[test]
fn url_parse_error_is_not_retryable() {
    let error = DownloadError::InvalidUrl(url::ParseError::EmptyHost);
    assert_eq!(error.category(), "url");
    assert!(!error.is_retryable());
}

#[test]
fn http_status_error_reports_status_and_url() {
    let error = DownloadError::http_status(404, "Not Found", "https://example.com/f");
    assert_eq!(error.category(), "http_status");
    assert!(!error.is_retryable());
    assert!(error.to_string().contains("404"));
}

#[test]
fn status_code_mapping_treats_server_errors_as_retryable() {
    for status in [500, 502, 503, 504, 429] {
        let error = DownloadError::from_status_code(status, "https://example.com/f");
        assert!(error.is_retryable(), "{status} should be retryable");
    }
}

#[test]
fn status_code_mapping_treats_client_errors_as_fatal() {
    for status in [400, 401, 403, 404, 416] {
        let error = DownloadError::from_status_code(status, "https://example.com/f");
        assert!(!error.is_retryable(), "{status} should not be retryable");
    }
}

#[test]
fn categories_are_comprehensive() {
    let cases: Vec<(DownloadError, &str)> = vec![
        (DownloadError::config("x"), "config"),
        (DownloadError::invalid_resource("x"), "invalid_resource"),
        (DownloadError::insufficient_disk_space("/", 1, 0), "disk_space"),
        (DownloadError::transport_transient(0, "x"), "transport_transient"),
        (DownloadError::http_status(404, "x", "u"), "http_status"),
        (DownloadError::Cancelled, "cancelled"),
        (DownloadError::fatal(0, "x"), "fatal"),
    ];

    for (error, expected) in cases {
        assert_eq!(error.category(), expected);
    }
}

#[test]
fn result_type_alias_round_trips() {
    fn ok_fn() -> chunked_downloader::Result<String> {
        Ok("success".to_string())
    }
    fn err_fn() -> chunked_downloader::Result<String> {
        Err(DownloadError::config("test error"))
    }

    assert_eq!(ok_fn().unwrap(), "success");
    assert_eq!(err_fn().unwrap_err().category(), "config");
}
