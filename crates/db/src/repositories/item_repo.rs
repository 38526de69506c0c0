//! Repository for the `items` table.
//!
//! Terminal transitions are conditional on the item still being `pending`,
//! so a redelivered task that finds its item already terminal cannot flip
//! the status or overwrite the output reference.

use pixbatch_core::batch::ItemSpec;
use pixbatch_core::types::{DbId, JobId};
use sqlx::PgPool;

use crate::models::item::{Item, ItemStatusCounts, StalePendingItem};
use crate::models::status::ItemStatus;

/// Column list for `items` queries.
const COLUMNS: &str = "\
    id, job_id, label, input_url, output_url, status_id, \
    created_at, completed_at";

/// Provides CRUD operations for items.
pub struct ItemRepo;

impl ItemRepo {
    /// Insert one `pending` item per spec, preserving submission order.
    ///
    /// Takes a connection so the dispatcher can run this inside the
    /// submission transaction.
    pub async fn insert_batch(
        conn: &mut sqlx::PgConnection,
        job_id: JobId,
        specs: &[ItemSpec],
    ) -> Result<Vec<Item>, sqlx::Error> {
        let query = format!(
            "INSERT INTO items (job_id, label, input_url, status_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let mut items = Vec::with_capacity(specs.len());
        for spec in specs {
            let item = sqlx::query_as::<_, Item>(&query)
                .bind(job_id)
                .bind(&spec.label)
                .bind(&spec.url)
                .bind(ItemStatus::Pending.id())
                .fetch_one(&mut *conn)
                .await?;
            items.push(item);
        }
        Ok(items)
    }

    /// Find an item by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Item>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM items WHERE id = $1");
        sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all items of a job in submission order.
    pub async fn list_by_job(pool: &PgPool, job_id: JobId) -> Result<Vec<Item>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM items WHERE job_id = $1 ORDER BY id");
        sqlx::query_as::<_, Item>(&query)
            .bind(job_id)
            .fetch_all(pool)
            .await
    }

    /// Transition a `pending` item to `processed`, recording its output.
    ///
    /// Returns `false` if the item was already terminal (idempotent no-op).
    pub async fn mark_processed(
        pool: &PgPool,
        id: DbId,
        output_url: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE items \
             SET status_id = $2, output_url = $3, completed_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(ItemStatus::Processed.id())
        .bind(output_url)
        .bind(ItemStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition a `pending` item to `failed`. `output_url` stays unset.
    ///
    /// Returns `false` if the item was already terminal (idempotent no-op).
    pub async fn mark_failed(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE items \
             SET status_id = $2, completed_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(ItemStatus::Failed.id())
        .bind(ItemStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count a job's items by status for the aggregator's completion check.
    pub async fn count_by_status(
        pool: &PgPool,
        job_id: JobId,
    ) -> Result<ItemStatusCounts, sqlx::Error> {
        sqlx::query_as::<_, ItemStatusCounts>(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE status_id = $2) AS pending, \
                    COUNT(*) FILTER (WHERE status_id = $3) AS failed \
             FROM items WHERE job_id = $1",
        )
        .bind(job_id)
        .bind(ItemStatus::Pending.id())
        .bind(ItemStatus::Failed.id())
        .fetch_one(pool)
        .await
    }

    /// List items still `pending` after `sla_secs`, with their task state.
    ///
    /// Used by the orphan sweep to find work that has been stuck past the
    /// operational SLA.
    pub async fn list_stale_pending(
        pool: &PgPool,
        sla_secs: f64,
    ) -> Result<Vec<StalePendingItem>, sqlx::Error> {
        sqlx::query_as::<_, StalePendingItem>(
            "SELECT i.id, i.job_id, i.input_url, t.attempts, t.claimed_at \
             FROM items i \
             JOIN tasks t ON t.item_id = i.id \
             WHERE i.status_id = $1 \
               AND i.created_at < NOW() - make_interval(secs => $2) \
             ORDER BY i.id",
        )
        .bind(ItemStatus::Pending.id())
        .bind(sla_secs)
        .fetch_all(pool)
        .await
    }
}
