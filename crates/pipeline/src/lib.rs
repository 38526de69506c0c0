//! The asynchronous batch job pipeline.
//!
//! Submission fans a batch out into independently fallible per-item tasks;
//! their outcomes are folded back into one job-level status with an
//! exactly-once completion webhook:
//!
//! - [`dispatcher`] — validates a submission and atomically persists the
//!   job, its items, and one queue task per item.
//! - [`fetch`] — bounded-timeout retrieval of source image bytes.
//! - [`processor`] — per-task fetch → transform → store → item transition.
//! - [`aggregator`] — detects the all-items-terminal transition and claims
//!   it exactly once.
//! - [`notifier`] — webhook delivery with bounded exponential-backoff retry.
//! - [`store`] — addressable local output storage.
//! - [`sweeper`] — background orphan sweep for items stuck `pending`.

pub mod aggregator;
pub mod dispatcher;
pub mod fetch;
pub mod notifier;
pub mod processor;
pub mod store;
pub mod sweeper;

pub use aggregator::Aggregator;
pub use notifier::{DeliveryError, Notifier};
pub use processor::Processor;
pub use store::LocalStore;
pub use sweeper::OrphanSweeper;
