//! Item entity model.

use pixbatch_core::types::{DbId, JobId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `items` table: one image fetch-and-transform unit.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Item {
    pub id: DbId,
    pub job_id: JobId,
    /// Opaque passthrough label from the submission row (e.g. product name).
    pub label: String,
    pub input_url: String,
    /// Set only when the item reaches `processed`.
    pub output_url: Option<String>,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

/// Per-job item status counts used by the aggregator.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ItemStatusCounts {
    pub total: i64,
    pub pending: i64,
    pub failed: i64,
}

/// A pending item past the operational SLA, joined with its task state.
///
/// Produced by the orphan sweep. `attempts` reflects how many times the
/// queue has handed out the corresponding task.
#[derive(Debug, Clone, FromRow)]
pub struct StalePendingItem {
    pub id: DbId,
    pub job_id: JobId,
    pub input_url: String,
    pub attempts: i32,
    pub claimed_at: Option<Timestamp>,
}
