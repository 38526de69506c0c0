//! Task queue entity model.

use pixbatch_core::types::{DbId, JobId, Timestamp};
use sqlx::FromRow;

/// A row from the `tasks` table: one unit of queued work per item.
///
/// Delivery is at-least-once: a claimed task whose lease expires becomes
/// claimable again until it is acked or its attempts are exhausted.
#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub id: DbId,
    pub job_id: JobId,
    pub item_id: DbId,
    /// Number of times this task has been handed to a worker.
    pub attempts: i32,
    pub claimed_at: Option<Timestamp>,
    pub acked_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
