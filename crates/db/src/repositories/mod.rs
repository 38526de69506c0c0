//! Repositories: all SQL for the `jobs`, `items`, and `tasks` tables.

pub mod item_repo;
pub mod job_repo;
pub mod task_repo;

pub use item_repo::ItemRepo;
pub use job_repo::JobRepo;
pub use task_repo::TaskRepo;
