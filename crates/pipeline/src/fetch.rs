//! Source image retrieval with a bounded timeout.

use std::time::Duration;

/// Error type for source fetch failures.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Source returned HTTP {0}")]
    HttpStatus(u16),
}

/// Fetch the raw bytes at `url`.
///
/// Any transport error, timeout, or non-2xx response is a [`FetchError`].
/// The timeout bounds the whole request so one dead source cannot occupy
/// a worker indefinitely.
pub async fn fetch_bytes(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url).timeout(timeout).send().await?;
    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }
    Ok(response.bytes().await?.to_vec())
}
