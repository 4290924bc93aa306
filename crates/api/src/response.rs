//! Shared response envelope types for API handlers.
//!
//! All read endpoints use a `{ "data": ... }` envelope. Use
//! [`DataResponse`] instead of ad-hoc `serde_json::json!({ "data": ... })`
//! to get compile-time type safety and consistent serialization. The
//! upload endpoint has its own `{job_id, status, message}` shape, kept
//! for compatibility with the original wire format.

use serde::Serialize;
use uuid::Uuid;

use printflow_core::job::JobStatus;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Response to a model submission: the id to poll plus the initial status.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub message: String,
}
