//! Repository for the `jobs` table.
//!
//! The exactly-once terminal transition lives here: [`JobRepo::finalize`]
//! is a compare-and-set on `status_id` and is the sole mechanism by which
//! a job becomes terminal.

use pixbatch_core::types::JobId;
use sqlx::PgPool;

use crate::models::job::Job;
use crate::models::status::JobStatus;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    job_id, status_id, callback_url, webhook_delivered_at, webhook_error, \
    created_at, completed_at";

/// Provides CRUD operations for jobs.
pub struct JobRepo;

impl JobRepo {
    /// Insert a new job in `processing` status.
    ///
    /// Takes a connection rather than a pool so the dispatcher can create
    /// the job, its items, and its queue tasks in a single transaction.
    pub async fn create(
        conn: &mut sqlx::PgConnection,
        job_id: JobId,
        callback_url: Option<&str>,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (job_id, status_id, callback_url) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .bind(JobStatus::Processing.id())
            .bind(callback_url)
            .fetch_one(conn)
            .await
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, job_id: JobId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE job_id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically transition a job from `processing` to a terminal status.
    ///
    /// Returns `true` only for the caller that won the transition; any
    /// concurrent or repeated call finds the status already terminal and
    /// gets `false`. The winner is the one allowed to trigger notification.
    pub async fn finalize(
        pool: &PgPool,
        job_id: JobId,
        status: JobStatus,
    ) -> Result<bool, sqlx::Error> {
        debug_assert!(status.is_terminal());
        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, completed_at = NOW() \
             WHERE job_id = $1 AND status_id = $3",
        )
        .bind(job_id)
        .bind(status.id())
        .bind(JobStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a successful webhook delivery for a terminal job.
    pub async fn record_webhook_delivery(
        pool: &PgPool,
        job_id: JobId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs SET webhook_delivered_at = NOW(), webhook_error = NULL \
             WHERE job_id = $1",
        )
        .bind(job_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a webhook delivery failure after retries were exhausted.
    ///
    /// The job's terminal status is never rolled back; the error is kept
    /// on the row so operators can find undelivered notifications.
    pub async fn record_webhook_failure(
        pool: &PgPool,
        job_id: JobId,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE jobs SET webhook_error = $2 WHERE job_id = $1")
            .bind(job_id)
            .bind(error)
            .execute(pool)
            .await?;
        Ok(())
    }
}
