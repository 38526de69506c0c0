//! Integration tests for the orphan sweep: failing items whose task has
//! exhausted its queue attempts, and sparing attempts still in flight.

use std::time::Duration;

use pixbatch_core::batch::{BatchRow, UrlList};
use pixbatch_db::models::status::{ItemStatus, JobStatus};
use pixbatch_db::repositories::{ItemRepo, JobRepo, TaskRepo};
use pixbatch_pipeline::{dispatcher, Aggregator, Notifier, OrphanSweeper};
use sqlx::PgPool;
use uuid::Uuid;

const MAX_ATTEMPTS: i32 = 3;
const EXPIRED_LEASE: f64 = 0.0;

fn sweeper(pool: &PgPool, sla: Duration, lease: Duration) -> OrphanSweeper {
    let aggregator = Aggregator::new(pool.clone(), Notifier::new());
    OrphanSweeper::new(pool.clone(), aggregator, sla, lease, MAX_ATTEMPTS)
}

/// Submit a single-URL job and hand its task out `n` times, as repeated
/// lease expiries would.
async fn seed_exhausted(pool: &PgPool, n: i32) -> (Uuid, i64) {
    let rows = vec![BatchRow {
        label: "w".to_string(),
        urls: UrlList::Joined("https://cdn.example.com/1.png".to_string()),
    }];
    let job_id = dispatcher::submit(pool, &rows, None).await.unwrap();
    let items = ItemRepo::list_by_job(pool, job_id).await.unwrap();

    for _ in 0..n {
        TaskRepo::claim_next(pool, EXPIRED_LEASE, MAX_ATTEMPTS)
            .await
            .unwrap()
            .expect("task must be claimable");
    }

    (job_id, items[0].id)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_fails_exhausted_item_and_finalizes_job(pool: PgPool) {
    let (job_id, item_id) = seed_exhausted(&pool, MAX_ATTEMPTS).await;

    // Zero SLA and zero lease: the item is stale and its last hand-out
    // is no longer in flight.
    sweeper(&pool, Duration::ZERO, Duration::ZERO)
        .sweep()
        .await
        .unwrap();

    let item = ItemRepo::find_by_id(&pool, item_id).await.unwrap().unwrap();
    assert_eq!(item.status_id, ItemStatus::Failed.id());

    let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Failed.id());
    assert!(job.completed_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_spares_final_attempt_within_live_lease(pool: PgPool) {
    // The final hand-out happened moments ago: a worker may still be
    // mid-fetch, so the sweep must not fail the item under its lease.
    let (job_id, item_id) = seed_exhausted(&pool, MAX_ATTEMPTS).await;

    sweeper(&pool, Duration::ZERO, Duration::from_secs(3600))
        .sweep()
        .await
        .unwrap();

    let item = ItemRepo::find_by_id(&pool, item_id).await.unwrap().unwrap();
    assert_eq!(item.status_id, ItemStatus::Pending.id());

    let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Processing.id());

    // The worker finishing under that lease still wins the transition.
    assert!(ItemRepo::mark_processed(&pool, item_id, "out/1.jpg")
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_leaves_redeliverable_items_alone(pool: PgPool) {
    // One hand-out left: the queue will redeliver, the sweep only logs.
    let (job_id, item_id) = seed_exhausted(&pool, MAX_ATTEMPTS - 1).await;

    sweeper(&pool, Duration::ZERO, Duration::ZERO)
        .sweep()
        .await
        .unwrap();

    let item = ItemRepo::find_by_id(&pool, item_id).await.unwrap().unwrap();
    assert_eq!(item.status_id, ItemStatus::Pending.id());

    let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Processing.id());
}
