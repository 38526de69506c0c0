//! Integration tests for the durable task queue: claiming, acking, lease
//! expiry redelivery, and the attempt cap.

use pixbatch_core::batch::ItemSpec;
use pixbatch_db::repositories::{ItemRepo, JobRepo, TaskRepo};
use sqlx::PgPool;
use uuid::Uuid;

const LONG_LEASE: f64 = 3600.0;
const EXPIRED_LEASE: f64 = 0.0;
const MAX_ATTEMPTS: i32 = 3;

async fn seed_tasks(pool: &PgPool, n: usize) -> Uuid {
    let specs: Vec<ItemSpec> = (0..n)
        .map(|i| ItemSpec {
            label: "p".to_string(),
            url: format!("https://cdn.example.com/{i}.png"),
        })
        .collect();

    let job_id = Uuid::new_v4();
    let mut tx = pool.begin().await.unwrap();
    JobRepo::create(&mut tx, job_id, None).await.unwrap();
    let items = ItemRepo::insert_batch(&mut tx, job_id, &specs).await.unwrap();
    let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
    TaskRepo::enqueue_batch(&mut tx, job_id, &ids).await.unwrap();
    tx.commit().await.unwrap();
    job_id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn each_task_is_claimed_once_within_lease(pool: PgPool) {
    seed_tasks(&pool, 2).await;

    let a = TaskRepo::claim_next(&pool, LONG_LEASE, MAX_ATTEMPTS)
        .await
        .unwrap()
        .expect("first task");
    let b = TaskRepo::claim_next(&pool, LONG_LEASE, MAX_ATTEMPTS)
        .await
        .unwrap()
        .expect("second task");
    assert_ne!(a.id, b.id);
    assert_eq!(a.attempts, 1);

    // Both leases are live; nothing is claimable.
    let none = TaskRepo::claim_next(&pool, LONG_LEASE, MAX_ATTEMPTS)
        .await
        .unwrap();
    assert!(none.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn acked_task_is_never_redelivered(pool: PgPool) {
    seed_tasks(&pool, 1).await;

    let task = TaskRepo::claim_next(&pool, EXPIRED_LEASE, MAX_ATTEMPTS)
        .await
        .unwrap()
        .unwrap();
    TaskRepo::ack(&pool, task.id).await.unwrap();

    // Even with an expired lease, an acked task stays gone.
    let none = TaskRepo::claim_next(&pool, EXPIRED_LEASE, MAX_ATTEMPTS)
        .await
        .unwrap();
    assert!(none.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_lease_redelivers_with_bumped_attempts(pool: PgPool) {
    seed_tasks(&pool, 1).await;

    let first = TaskRepo::claim_next(&pool, EXPIRED_LEASE, MAX_ATTEMPTS)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.attempts, 1);

    // Unacked and the lease already expired: at-least-once redelivery.
    let second = TaskRepo::claim_next(&pool, EXPIRED_LEASE, MAX_ATTEMPTS)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.attempts, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn attempt_cap_stops_redelivery(pool: PgPool) {
    seed_tasks(&pool, 1).await;

    for expected in 1..=MAX_ATTEMPTS {
        let task = TaskRepo::claim_next(&pool, EXPIRED_LEASE, MAX_ATTEMPTS)
            .await
            .unwrap()
            .expect("claimable while under the cap");
        assert_eq!(task.attempts, expected);
    }

    let none = TaskRepo::claim_next(&pool, EXPIRED_LEASE, MAX_ATTEMPTS)
        .await
        .unwrap();
    assert!(none.is_none(), "cap reached, task must not be handed out again");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stale_pending_items_surface_with_task_state(pool: PgPool) {
    seed_tasks(&pool, 1).await;

    // Exhaust the task's attempts.
    for _ in 0..MAX_ATTEMPTS {
        TaskRepo::claim_next(&pool, EXPIRED_LEASE, MAX_ATTEMPTS)
            .await
            .unwrap()
            .unwrap();
    }

    // With a zero SLA every pending item is stale.
    let stale = ItemRepo::list_stale_pending(&pool, 0.0).await.unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].attempts, MAX_ATTEMPTS);
    assert!(stale[0].claimed_at.is_some());
}
