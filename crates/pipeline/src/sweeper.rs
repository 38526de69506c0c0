//! Orphan sweep: background detection of items stuck `pending`.
//!
//! A submission commits items and queue tasks atomically, so an item can
//! only stay `pending` past the SLA if its task keeps failing to reach a
//! terminal state (worker crashes mid-flight, repeated lease expiry).
//! Items whose task has exhausted its delivery attempts and holds no
//! live lease are failed here so the job can still reach a terminal
//! status; items merely stale are logged as an operational signal.

use std::time::Duration;

use pixbatch_core::types::Timestamp;
use pixbatch_db::repositories::ItemRepo;
use pixbatch_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::aggregator::Aggregator;

/// Default interval between sweep passes.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Background orphan sweeper.
///
/// A single long-lived Tokio task, cancelled via [`CancellationToken`].
pub struct OrphanSweeper {
    pool: DbPool,
    aggregator: Aggregator,
    interval: Duration,
    /// Age past which a pending item counts as stuck.
    sla: Duration,
    /// Claim lease; must match the workers' claim configuration.
    lease: Duration,
    /// Queue attempt cap; must match the workers' claim configuration.
    max_attempts: i32,
}

impl OrphanSweeper {
    pub fn new(
        pool: DbPool,
        aggregator: Aggregator,
        sla: Duration,
        lease: Duration,
        max_attempts: i32,
    ) -> Self {
        Self {
            pool,
            aggregator,
            interval: DEFAULT_SWEEP_INTERVAL,
            sla,
            lease,
            max_attempts,
        }
    }

    /// Override the sweep interval (used by tests).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            sla_secs = self.sla.as_secs(),
            "Orphan sweeper started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Orphan sweeper shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        tracing::error!(error = %e, "Orphan sweep failed");
                    }
                }
            }
        }
    }

    /// One sweep pass over all stale pending items.
    ///
    /// An item is only failed once its task has exhausted the attempt
    /// cap AND its last lease has expired — a worker may still be
    /// mid-flight on the final attempt, and its conditional item update
    /// must win over the sweep in that window.
    pub async fn sweep(&self) -> Result<(), sqlx::Error> {
        let stale = ItemRepo::list_stale_pending(&self.pool, self.sla.as_secs_f64()).await?;

        for orphan in stale {
            if orphan.attempts >= self.max_attempts && !self.lease_live(orphan.claimed_at) {
                // The queue will never hand this task out again; fail the
                // item so the job can terminate.
                let updated = ItemRepo::mark_failed(&self.pool, orphan.id).await?;
                if updated {
                    tracing::warn!(
                        job_id = %orphan.job_id,
                        item_id = orphan.id,
                        input_url = %orphan.input_url,
                        attempts = orphan.attempts,
                        "Orphaned item failed after exhausting queue attempts",
                    );
                    self.aggregator.check(orphan.job_id).await?;
                }
            } else {
                tracing::warn!(
                    job_id = %orphan.job_id,
                    item_id = orphan.id,
                    attempts = orphan.attempts,
                    claimed_at = ?orphan.claimed_at,
                    "Item pending past SLA (attempt still redeliverable or in flight)",
                );
            }
        }

        Ok(())
    }

    /// Whether a claim taken at `claimed_at` is still within its lease.
    fn lease_live(&self, claimed_at: Option<Timestamp>) -> bool {
        claimed_at.is_some_and(|claimed| {
            chrono::Utc::now().signed_duration_since(claimed)
                < chrono::Duration::seconds(self.lease.as_secs() as i64)
        })
    }
}
