//! Completion webhook delivery with exponential-backoff retry.
//!
//! [`Notifier`] POSTs the terminal [`JobView`] payload to a job's callback
//! URL. Failed attempts are retried with exponential backoff (1 s, 2 s,
//! 4 s); after the final attempt the error is returned to the caller, who
//! records it on the job row — delivery failures are never swallowed.

use std::time::Duration;

use pixbatch_db::models::item::Item;
use pixbatch_db::models::job::{Job, JobView};

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The callback endpoint returned a non-2xx status code.
    #[error("Callback returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Delivers terminal job state to registered callback URLs.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
}

impl Notifier {
    /// Create a new notifier with a pre-configured HTTP client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }

    /// Deliver the terminal state of `job` to its callback URL, if any.
    ///
    /// A job without a callback URL is a no-op. Retries with bounded
    /// backoff before giving up; returns `Ok(())` on the first successful
    /// attempt.
    pub async fn notify(&self, job: &Job, items: &[Item]) -> Result<(), DeliveryError> {
        let Some(url) = job.callback_url.as_deref() else {
            tracing::debug!(job_id = %job.job_id, "No callback URL registered, skipping webhook");
            return Ok(());
        };

        let payload = serde_json::to_value(JobView::from_parts(job, items))
            .expect("JobView serialization is infallible");

        for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match self.try_send(url, &payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        job_id = %job.job_id,
                        attempt = attempt + 1,
                        url,
                        error = %e,
                        "Webhook delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
            }
        }

        // Final attempt after the last backoff.
        match self.try_send(url, &payload).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(
                    job_id = %job.job_id,
                    url,
                    error = %e,
                    "Webhook delivery failed after all retries"
                );
                Err(e)
            }
        }
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, url: &str, payload: &serde_json::Value) -> Result<(), DeliveryError> {
        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(DeliveryError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
