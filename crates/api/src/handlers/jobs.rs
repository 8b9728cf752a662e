//! Handlers for the `/jobs` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/jobs/{id}
///
/// Latest snapshot of a tracked job.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.tracker.snapshot(&job_id).await?;
    Ok(Json(DataResponse { data: snapshot }))
}

/// POST /api/v1/jobs/{id}/cancel
///
/// Stop polling a job. The vendor-side job is not affected; the snapshot
/// keeps its last observed state with `cancelled` set. Returns 409 if the
/// job has already finished.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.tracker.cancel(&job_id).await?;
    Ok(Json(DataResponse { data: snapshot }))
}
