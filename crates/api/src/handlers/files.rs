//! Raw model file download handler.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use printflow_core::error::CoreError;
use printflow_core::upload::is_safe_stored_name;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/file/{name}
///
/// Raw bytes of a stored model file. Only plain stored names are served;
/// anything resembling a path is rejected before touching the filesystem.
pub async fn get_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    if !is_safe_stored_name(&name) {
        return Err(AppError::BadRequest("Invalid file name".to_string()));
    }

    let path = state.config.model_dir.join(&name);
    let bytes = tokio::fs::read(&path).await.map_err(|_| {
        AppError::Core(CoreError::NotFound {
            entity: "File",
            id: name.clone(),
        })
    })?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    ))
}
