//! Per-task execution: fetch the source image, transform it, store the
//! output, and commit the item's terminal status.
//!
//! Fetch and transform failures are terminal for the item and are recorded
//! as `failed` — they never propagate out of [`Processor::handle`] and
//! never affect sibling items. Database and storage errors do propagate,
//! leaving the item `pending` so the queue's lease expiry redelivers it.

use std::time::Duration;

use pixbatch_core::transform::{recompress_jpeg, TransformError};
use pixbatch_core::types::{DbId, JobId};
use pixbatch_db::models::item::Item;
use pixbatch_db::models::status::ItemStatus;
use pixbatch_db::repositories::ItemRepo;
use pixbatch_db::DbPool;

use crate::aggregator::Aggregator;
use crate::fetch::{fetch_bytes, FetchError};
use crate::store::LocalStore;

/// Error type for a processing invocation that could not reach a terminal
/// item state. The task stays unacked and will be redelivered.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The output could not be written to the store.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Why an item's processing failed terminally.
#[derive(Debug, thiserror::Error)]
enum ItemFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Executes one fetch-transform task at a time.
#[derive(Clone)]
pub struct Processor {
    pool: DbPool,
    client: reqwest::Client,
    store: LocalStore,
    aggregator: Aggregator,
    fetch_timeout: Duration,
}

impl Processor {
    pub fn new(
        pool: DbPool,
        store: LocalStore,
        aggregator: Aggregator,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            client: reqwest::Client::new(),
            store,
            aggregator,
            fetch_timeout,
        }
    }

    /// Process one `(job_id, item_id)` work unit.
    ///
    /// Safe under queue redelivery: an item already terminal skips the
    /// fetch and transform and only re-runs the completion check. The
    /// item's terminal status is committed before the aggregator runs,
    /// so completion is never observed ahead of durable state.
    pub async fn handle(&self, job_id: JobId, item_id: DbId) -> Result<(), ProcessError> {
        let Some(item) = ItemRepo::find_by_id(&self.pool, item_id).await? else {
            // A task without an item should not exist; ack it away.
            tracing::error!(%job_id, item_id, "Task references a missing item");
            return Ok(());
        };

        if ItemStatus::from_id(item.status_id).is_some_and(ItemStatus::is_terminal) {
            tracing::debug!(%job_id, item_id, "Item already terminal, skipping redelivery");
            // A crash between the item commit and the job finalization
            // leaves the redelivered task as the only finalization
            // trigger left; the check is CAS-protected, so re-running
            // it here is safe.
            self.aggregator.check(job_id).await?;
            return Ok(());
        }

        match self.fetch_and_transform(&item).await {
            Ok(output_url) => {
                let updated = ItemRepo::mark_processed(&self.pool, item_id, &output_url).await?;
                if updated {
                    tracing::info!(%job_id, item_id, output_url, "Item processed");
                }
            }
            Err(ProcessOutcome::Item(failure)) => {
                let updated = ItemRepo::mark_failed(&self.pool, item_id).await?;
                if updated {
                    tracing::warn!(
                        %job_id,
                        item_id,
                        input_url = %item.input_url,
                        error = %failure,
                        "Item failed",
                    );
                }
            }
            Err(ProcessOutcome::Retryable(e)) => return Err(e),
        }

        self.aggregator.check(job_id).await?;
        Ok(())
    }

    /// Fetch, transform, and store one item's image.
    async fn fetch_and_transform(&self, item: &Item) -> Result<String, ProcessOutcome> {
        let bytes = fetch_bytes(&self.client, &item.input_url, self.fetch_timeout)
            .await
            .map_err(ItemFailure::from)?;

        let output = recompress_jpeg(&bytes).map_err(ItemFailure::from)?;

        let output_url = self
            .store
            .write(&output)
            .await
            .map_err(|e| ProcessOutcome::Retryable(e.into()))?;

        Ok(output_url)
    }
}

/// Internal split between item-terminal failures and retryable errors.
enum ProcessOutcome {
    Item(ItemFailure),
    Retryable(ProcessError),
}

impl From<ItemFailure> for ProcessOutcome {
    fn from(failure: ItemFailure) -> Self {
        ProcessOutcome::Item(failure)
    }
}
