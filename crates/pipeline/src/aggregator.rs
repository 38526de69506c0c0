//! Job completion detection and the exactly-once terminal transition.
//!
//! [`Aggregator::check`] runs after every terminal item transition. The
//! completion decision itself is the pure [`decide`] function; claiming
//! the transition is `JobRepo::finalize`, a compare-and-set on the job's
//! status. Only the caller that wins the CAS invokes the notifier, so
//! the last two items of a job racing to completion trigger exactly one
//! webhook.

use pixbatch_core::types::JobId;
use pixbatch_db::models::item::ItemStatusCounts;
use pixbatch_db::models::status::JobStatus;
use pixbatch_db::repositories::{ItemRepo, JobRepo};
use pixbatch_db::DbPool;

use crate::notifier::Notifier;

/// Compute the job's terminal status from its item counts.
///
/// Returns `None` while any item is still pending. Once all items are
/// terminal the job is `completed` iff every item is `processed`.
pub fn decide(counts: &ItemStatusCounts) -> Option<JobStatus> {
    if counts.pending > 0 {
        return None;
    }
    if counts.failed == 0 {
        Some(JobStatus::Completed)
    } else {
        Some(JobStatus::Failed)
    }
}

/// Folds per-item outcomes into the job-level status.
#[derive(Clone)]
pub struct Aggregator {
    pool: DbPool,
    notifier: Notifier,
}

impl Aggregator {
    pub fn new(pool: DbPool, notifier: Notifier) -> Self {
        Self { pool, notifier }
    }

    /// Check whether `job_id` just became terminal and, if this caller
    /// wins the transition, deliver the completion webhook.
    ///
    /// Safe to call any number of times, concurrently, for the same job:
    /// the CAS in `JobRepo::finalize` admits exactly one winner, and
    /// losers return without side effects.
    pub async fn check(&self, job_id: JobId) -> Result<(), sqlx::Error> {
        let counts = ItemRepo::count_by_status(&self.pool, job_id).await?;

        let Some(status) = decide(&counts) else {
            return Ok(());
        };

        if !JobRepo::finalize(&self.pool, job_id, status).await? {
            // Another completion already claimed the transition.
            return Ok(());
        }

        tracing::info!(
            %job_id,
            status = status.as_str(),
            items = counts.total,
            failed = counts.failed,
            "Job reached terminal status",
        );

        self.deliver_webhook(job_id).await
    }

    /// Deliver the completion webhook and record the outcome on the job.
    ///
    /// Delivery failure never reverses the terminal status; after retries
    /// are exhausted the error lands in `webhook_error` for operators.
    async fn deliver_webhook(&self, job_id: JobId) -> Result<(), sqlx::Error> {
        let Some(job) = JobRepo::find_by_id(&self.pool, job_id).await? else {
            tracing::error!(%job_id, "Finalized job vanished before webhook delivery");
            return Ok(());
        };

        if job.callback_url.is_none() {
            return Ok(());
        }

        let items = ItemRepo::list_by_job(&self.pool, job_id).await?;

        match self.notifier.notify(&job, &items).await {
            Ok(()) => JobRepo::record_webhook_delivery(&self.pool, job_id).await,
            Err(e) => {
                JobRepo::record_webhook_failure(&self.pool, job_id, &e.to_string()).await
            }
        }
    }
}
