//! HTTP fetch utilities for the Wren pipeline.
//!
//! Provides simple blocking HTTP GET wrappers. The engine runs these on
//! worker threads; completions are handed back to the pipeline thread as
//! mutation events, so nothing here touches the document tree.

use base64::Engine;
use std::time::Duration;

/// User-Agent header sent with all requests.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; Wren/0.1)";

/// Default request timeout.
const TIMEOUT: Duration = Duration::from_secs(30);

/// Error produced while fetching or decoding a subresource.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
    /// The request itself failed (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Request(String),
    /// The server answered with a non-success status.
    #[error("HTTP error: {0}")]
    Status(String),
    /// The response body could not be read or decoded.
    #[error("failed to read response body: {0}")]
    Body(String),
    /// A `data:` URL could not be decoded.
    #[error("invalid data URL: {0}")]
    DataUrl(String),
}

/// Fetch a URL and return its body as text.
///
/// # Errors
///
/// Returns a [`FetchError`] if the HTTP client cannot be created, the request
/// fails, the response has a non-success status, or the body cannot be
/// decoded.
pub fn fetch_text(url: &str) -> Result<String, FetchError> {
    let response = send_get(url)?;
    response
        .text()
        .map_err(|e| FetchError::Body(e.to_string()))
}

/// Fetch a URL and return its body as raw bytes.
///
/// `data:` URLs are decoded locally without a network round trip.
///
/// # Errors
///
/// Returns a [`FetchError`] if the HTTP client cannot be created, the request
/// fails, the response has a non-success status, or the body cannot be read.
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>, FetchError> {
    if url.starts_with("data:") {
        return decode_data_url(url);
    }
    let response = send_get(url)?;
    response
        .bytes()
        .map(|b| b.to_vec())
        .map_err(|e| FetchError::Body(e.to_string()))
}

/// Issue a blocking GET with the standard UA header and timeout.
fn send_get(url: &str) -> Result<reqwest::blocking::Response, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(TIMEOUT)
        .build()
        .map_err(|e| FetchError::Client(e.to_string()))?;

    let response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .map_err(|e| FetchError::Request(e.to_string()))?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status().to_string()));
    }
    Ok(response)
}

/// Decode a `data:` URL payload into raw bytes.
///
/// Currently supports base64-encoded data URLs only.
///
/// # Errors
///
/// Returns a [`FetchError::DataUrl`] if the URL is malformed or uses an
/// encoding other than base64.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, FetchError> {
    let data_url = url
        .strip_prefix("data:")
        .ok_or_else(|| FetchError::DataUrl("missing data: scheme".to_string()))?;

    let (metadata, data) = data_url
        .split_once(',')
        .ok_or_else(|| FetchError::DataUrl("missing comma".to_string()))?;

    if metadata.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| FetchError::DataUrl(format!("base64 decode error: {e}")))
    } else {
        Err(FetchError::DataUrl(format!(
            "unsupported encoding: {metadata}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_data_url() {
        // "Hi" base64-encoded
        let bytes = decode_data_url("data:text/plain;base64,SGk=").unwrap();
        assert_eq!(bytes, b"Hi");
    }

    #[test]
    fn rejects_data_url_without_comma() {
        let err = decode_data_url("data:text/plain;base64").unwrap_err();
        assert!(matches!(err, FetchError::DataUrl(_)));
    }

    #[test]
    fn rejects_non_base64_encoding() {
        let err = decode_data_url("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, FetchError::DataUrl(_)));
    }
}
