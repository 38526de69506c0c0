//! Repository for the `tasks` table — the durable work queue.
//!
//! Claiming uses `SELECT ... FOR UPDATE SKIP LOCKED` so concurrent workers
//! never receive the same task while a claim is live. Delivery is
//! at-least-once: an unacked task whose lease has expired is claimable
//! again, with `attempts` counting every hand-out.

use pixbatch_core::types::{DbId, JobId};
use sqlx::PgPool;

use crate::models::task::Task;

/// Column list for `tasks` queries.
const COLUMNS: &str = "id, job_id, item_id, attempts, claimed_at, acked_at, created_at";

/// Provides queue operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Enqueue one task per item.
    ///
    /// Takes a connection so the dispatcher can enqueue in the same
    /// transaction that creates the job and its items — a crash can never
    /// leave items without corresponding queue entries.
    pub async fn enqueue_batch(
        conn: &mut sqlx::PgConnection,
        job_id: JobId,
        item_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        for item_id in item_ids {
            sqlx::query("INSERT INTO tasks (job_id, item_id) VALUES ($1, $2)")
                .bind(job_id)
                .bind(item_id)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Atomically claim the next ready task.
    ///
    /// A task is ready when it is unacked, has fewer than `max_attempts`
    /// hand-outs, and is either unclaimed or holds a lease older than
    /// `lease_secs`. Claiming bumps `attempts` and refreshes the lease.
    /// Returns `None` when no task is ready.
    pub async fn claim_next(
        pool: &PgPool,
        lease_secs: f64,
        max_attempts: i32,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks \
             SET claimed_at = NOW(), attempts = attempts + 1 \
             WHERE id = ( \
                 SELECT id FROM tasks \
                 WHERE acked_at IS NULL \
                   AND attempts < $2 \
                   AND (claimed_at IS NULL \
                        OR claimed_at < NOW() - make_interval(secs => $1)) \
                 ORDER BY id \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(lease_secs)
            .bind(max_attempts)
            .fetch_optional(pool)
            .await
    }

    /// Acknowledge a task after its item reached a terminal state.
    ///
    /// Acked tasks are never redelivered. Acking twice is harmless.
    pub async fn ack(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET acked_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
