//! Batch submission: validate, explode, and atomically persist + enqueue.

use pixbatch_core::batch::{explode_rows, BatchRow};
use pixbatch_core::error::CoreError;
use pixbatch_core::types::JobId;
use pixbatch_db::repositories::{ItemRepo, JobRepo, TaskRepo};
use pixbatch_db::DbPool;

/// Error type for batch submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The submission shape was invalid; nothing was persisted.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Submit a batch: one job, one item per exploded URL, one task per item.
///
/// Validation happens before any write, so a bad row rejects the whole
/// submission with nothing persisted. Job, items, and queue tasks are
/// committed in a single transaction — the aggregator can never observe a
/// half-submitted batch, and no item can exist without a queue entry.
///
/// URL reachability is deliberately not checked here; that is the
/// processor's job.
pub async fn submit(
    pool: &DbPool,
    rows: &[BatchRow],
    callback_url: Option<&str>,
) -> Result<JobId, SubmitError> {
    let specs = explode_rows(rows)?;

    let job_id = JobId::new_v4();

    let mut tx = pool.begin().await?;
    JobRepo::create(&mut tx, job_id, callback_url).await?;
    let items = ItemRepo::insert_batch(&mut tx, job_id, &specs).await?;
    let item_ids: Vec<_> = items.iter().map(|item| item.id).collect();
    TaskRepo::enqueue_batch(&mut tx, job_id, &item_ids).await?;
    tx.commit().await?;

    tracing::info!(
        %job_id,
        rows = rows.len(),
        items = item_ids.len(),
        has_callback = callback_url.is_some(),
        "Batch submitted",
    );

    Ok(job_id)
}
