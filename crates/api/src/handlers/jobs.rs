//! Job status and review handlers.
//!
//! Reads serve snapshots straight from the job store, independent of the
//! queue. Approve/reject are the operator's terminal decisions on a
//! completed job; the transition graph (enforced by the store) rejects
//! them in any other state.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use printflow_core::error::CoreError;
use printflow_core::job::JobStatus;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/jobs
///
/// All job records, newest first.
pub async fn list_jobs(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let jobs = state.jobs.list().await;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/job/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let job = state.jobs.get(id).await.ok_or(AppError::Core(CoreError::NotFound {
        entity: "Job",
        id: id.to_string(),
    }))?;
    Ok(Json(DataResponse { data: job }))
}

/// POST /api/job/{id}/approve
///
/// Approve a completed job for printing. Conflict unless the job is
/// `completed`.
pub async fn approve_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let job = state
        .jobs
        .transition(id, JobStatus::Approved, |j| {
            j.approved_at = Some(Utc::now());
        })
        .await?;

    tracing::info!(job_id = %id, "Job approved");

    Ok(Json(DataResponse { data: job }))
}

/// POST /api/job/{id}/reject
///
/// Reject a completed job. Conflict unless the job is `completed`.
pub async fn reject_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let job = state
        .jobs
        .transition(id, JobStatus::Rejected, |j| {
            j.rejected_at = Some(Utc::now());
        })
        .await?;

    tracing::info!(job_id = %id, "Job rejected");

    Ok(Json(DataResponse { data: job }))
}
