use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// ```text
/// GET  /jobs               -> list_jobs
/// GET  /job/{id}           -> get_job
/// POST /job/{id}/approve   -> approve_job
/// POST /job/{id}/reject    -> reject_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(jobs::list_jobs))
        .route("/job/{id}", get(jobs::get_job))
        .route("/job/{id}/approve", post(jobs::approve_job))
        .route("/job/{id}/reject", post(jobs::reject_job))
}
