//! Worker runtime: claims tasks from the queue and runs the processor.
//!
//! Each worker is an independent poll loop; `concurrency` of them share
//! one pool and one queue, relying on `FOR UPDATE SKIP LOCKED` claiming
//! to never receive the same task twice within a lease.

use std::path::PathBuf;
use std::time::Duration;

use pixbatch_db::repositories::TaskRepo;
use pixbatch_db::DbPool;
use pixbatch_pipeline::{Aggregator, LocalStore, Notifier, Processor};
use tokio_util::sync::CancellationToken;

/// Worker configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent poll loops (default: `4`).
    pub concurrency: usize,
    /// Delay between polls when the queue is empty (default: `500` ms).
    pub poll_interval: Duration,
    /// Claim lease; an unacked task is redelivered after this (default: `60` s).
    pub lease: Duration,
    /// Maximum queue hand-outs per task (default: `3`).
    pub max_attempts: i32,
    /// Timeout for one source image fetch (default: `30` s).
    pub fetch_timeout: Duration,
    /// Directory for processed output images (default: `processed_images`).
    pub output_dir: PathBuf,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default            |
    /// |-----------------------|--------------------|
    /// | `WORKER_CONCURRENCY`  | `4`                |
    /// | `POLL_INTERVAL_MS`    | `500`              |
    /// | `TASK_LEASE_SECS`     | `60`               |
    /// | `TASK_MAX_ATTEMPTS`   | `3`                |
    /// | `FETCH_TIMEOUT_SECS`  | `30`               |
    /// | `OUTPUT_DIR`          | `processed_images` |
    pub fn from_env() -> Self {
        Self {
            concurrency: env_parse("WORKER_CONCURRENCY", 4),
            poll_interval: Duration::from_millis(env_parse("POLL_INTERVAL_MS", 500)),
            lease: Duration::from_secs(env_parse("TASK_LEASE_SECS", 60)),
            max_attempts: env_parse("TASK_MAX_ATTEMPTS", 3),
            fetch_timeout: Duration::from_secs(env_parse("FETCH_TIMEOUT_SECS", 30)),
            output_dir: std::env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| "processed_images".into())
                .into(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{var} must be valid: {e}")),
        Err(_) => default,
    }
}

/// A single task-claiming poll loop.
pub struct Worker {
    id: usize,
    pool: DbPool,
    processor: Processor,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(id: usize, pool: DbPool, processor: Processor, config: WorkerConfig) -> Self {
        Self {
            id,
            pool,
            processor,
            config,
        }
    }

    /// Run the claim loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        tracing::info!(worker = self.id, "Worker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(worker = self.id, "Worker shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.drain(&cancel).await;
                }
            }
        }
    }

    /// Claim and process tasks until the queue is empty or shutdown begins.
    async fn drain(&self, cancel: &CancellationToken) {
        while !cancel.is_cancelled() {
            let claimed = TaskRepo::claim_next(
                &self.pool,
                self.config.lease.as_secs_f64(),
                self.config.max_attempts,
            )
            .await;

            let task = match claimed {
                Ok(Some(task)) => task,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(worker = self.id, error = %e, "Task claim failed");
                    break;
                }
            };

            tracing::debug!(
                worker = self.id,
                task_id = task.id,
                job_id = %task.job_id,
                item_id = task.item_id,
                attempt = task.attempts,
                "Task claimed",
            );

            match self.processor.handle(task.job_id, task.item_id).await {
                Ok(()) => {
                    if let Err(e) = TaskRepo::ack(&self.pool, task.id).await {
                        // The item is already terminal; redelivery will
                        // no-op, so this is not fatal.
                        tracing::warn!(task_id = task.id, error = %e, "Task ack failed");
                    }
                }
                Err(e) => {
                    // Leave the task unacked; the lease expiry redelivers it.
                    tracing::error!(
                        worker = self.id,
                        task_id = task.id,
                        job_id = %task.job_id,
                        item_id = task.item_id,
                        error = %e,
                        "Task processing failed, will be redelivered",
                    );
                }
            }
        }
    }
}

/// Spawn `config.concurrency` workers sharing one pool and queue.
pub fn spawn_workers(
    pool: DbPool,
    config: &WorkerConfig,
    cancel: &CancellationToken,
) -> Vec<tokio::task::JoinHandle<()>> {
    let notifier = Notifier::new();
    let aggregator = Aggregator::new(pool.clone(), notifier);
    let store = LocalStore::new(config.output_dir.clone());
    let processor = Processor::new(
        pool.clone(),
        store,
        aggregator,
        config.fetch_timeout,
    );

    (0..config.concurrency)
        .map(|id| {
            let worker = Worker::new(id, pool.clone(), processor.clone(), config.clone());
            let cancel = cancel.clone();
            tokio::spawn(async move { worker.run(cancel).await })
        })
        .collect()
}
