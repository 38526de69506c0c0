pub mod batches;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /batches            POST submit a batch
/// /batches/{job_id}   GET  job status with all items
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/batches", batches::router())
}
