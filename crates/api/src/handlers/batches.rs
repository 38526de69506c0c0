//! Handlers for the `/batches` resource: batch submission and status query.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pixbatch_core::batch::BatchRow;
use pixbatch_core::error::CoreError;
use pixbatch_core::types::JobId;
use pixbatch_db::models::job::JobView;
use pixbatch_db::repositories::{ItemRepo, JobRepo};
use pixbatch_pipeline::dispatcher;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /api/v1/batches`.
#[derive(Debug, Deserialize)]
pub struct SubmitBatch {
    /// Parsed CSV rows: a label plus its URL list (comma-joined or array).
    pub rows: Vec<BatchRow>,
    /// Optional endpoint notified once the whole batch is terminal.
    pub callback_url: Option<String>,
}

/// Response body for a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmittedBatch {
    pub job_id: JobId,
}

/// POST /api/v1/batches
///
/// Submit a batch of image URLs for processing. Returns 202 with the job
/// ID; processing happens asynchronously on the workers. An invalid row
/// rejects the whole submission with 400 and persists nothing.
pub async fn submit_batch(
    State(state): State<AppState>,
    Json(input): Json<SubmitBatch>,
) -> AppResult<impl IntoResponse> {
    let job_id =
        dispatcher::submit(&state.pool, &input.rows, input.callback_url.as_deref()).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SubmittedBatch { job_id },
        }),
    ))
}

/// GET /api/v1/batches/{job_id}
///
/// Current status of a job and all its items. A pure read of
/// last-committed state; 404 for unknown job IDs.
pub async fn get_status(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let job = JobRepo::find_by_id(&state.pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id.to_string(),
        }))?;

    let items = ItemRepo::list_by_job(&state.pool, job_id).await?;

    Ok(Json(DataResponse {
        data: JobView::from_parts(&job, &items),
    }))
}
