//! Model submission handler.
//!
//! Accepts a multipart upload, validates it synchronously (extension,
//! field values, 3MF conversion), stores the model file, then creates the
//! pending job and hands its id to the engine. The response returns
//! immediately with the job id; slicing happens in the background worker
//! and clients poll `GET /api/job/{id}`.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use printflow_core::job::Job;
use printflow_core::upload::{sanitize_filename, validate_upload_filename};
use printflow_slicer::convert::convert_to_stl;

use crate::error::{AppError, AppResult};
use crate::response::UploadResponse;
use crate::state::AppState;

/// Parsed multipart form for a model submission.
#[derive(Default)]
struct UploadForm {
    file_bytes: Option<Vec<u8>>,
    original_filename: String,
    material_id: String,
    color_id: String,
    quality_id: Option<String>,
    fill_density: Option<f64>,
    enable_supports: bool,
}

/// POST /api/upload
pub async fn upload_model(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = read_form(multipart).await?;

    let file_bytes = form
        .file_bytes
        .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    if form.material_id.is_empty() {
        return Err(AppError::BadRequest("material_id is required".to_string()));
    }
    if form.color_id.is_empty() {
        return Err(AppError::BadRequest("color_id is required".to_string()));
    }
    if let Some(density) = form.fill_density {
        if !(0.0..=1.0).contains(&density) {
            return Err(AppError::BadRequest(
                "fill_density must be a fraction in [0, 1]".to_string(),
            ));
        }
    }

    let original = sanitize_filename(&form.original_filename);
    let extension = validate_upload_filename(&original)?;

    // Store under a unique name so concurrent uploads of "part.stl" never
    // clobber each other.
    let mut stored = format!("{}_{original}", Uuid::new_v4().simple());
    let stored_path = state.config.model_dir.join(&stored);
    tokio::fs::write(&stored_path, &file_bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Could not store upload: {e}")))?;

    // 3MF models are converted to STL up front; a conversion failure
    // rejects the submission before any job exists.
    if extension == "3mf" {
        let timeout = std::time::Duration::from_secs(state.config.slicer_timeout_secs);
        match convert_to_stl(&state.config.slicer_binary, &stored_path, timeout).await {
            Ok(stl_path) => {
                stored = stl_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .ok_or_else(|| {
                        AppError::InternalError("converted file has no name".to_string())
                    })?;
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&stored_path).await;
                return Err(AppError::BadRequest(format!(
                    "Could not convert model to STL: {e}"
                )));
            }
        }
    }

    let job = Job::new(
        stored,
        original,
        form.material_id,
        form.color_id,
        form.quality_id,
        form.fill_density,
        form.enable_supports,
    );
    let job_id = job.id;
    let status = job.status;

    state.jobs.insert(job).await;
    state.engine.submit(job_id);

    tracing::info!(job_id = %job_id, "Model upload accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            job_id,
            status,
            message: "Model queued for slicing".to_string(),
        }),
    ))
}

/// Drain the multipart stream into an [`UploadForm`].
async fn read_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "file" => {
                form.original_filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Could not read upload: {e}")))?;
                form.file_bytes = Some(bytes.to_vec());
            }
            other => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Could not read field: {e}")))?;
                match other {
                    "material_id" => form.material_id = value,
                    "color_id" => form.color_id = value,
                    "quality_id" => {
                        if !value.is_empty() {
                            form.quality_id = Some(value);
                        }
                    }
                    "fill_density" => {
                        if !value.is_empty() {
                            form.fill_density = Some(value.parse().map_err(|_| {
                                AppError::BadRequest(
                                    "fill_density must be a number".to_string(),
                                )
                            })?);
                        }
                    }
                    "enable_supports" => {
                        form.enable_supports = matches!(value.as_str(), "true" | "1" | "on");
                    }
                    // Unknown fields are ignored for forward compatibility.
                    _ => {}
                }
            }
        }
    }

    Ok(form)
}
