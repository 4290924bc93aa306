//! Catalog read/replace handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/materials
///
/// The full pricing catalog document.
pub async fn get_materials(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let catalog = state.catalog.snapshot().await;
    Ok(Json(DataResponse {
        data: catalog.as_ref().clone(),
    }))
}

/// POST /api/materials
///
/// Replace the catalog wholesale. The payload is validated in full before
/// the persisted document is touched, so a bad replace can never corrupt
/// the stored catalog.
pub async fn replace_materials(
    State(state): State<AppState>,
    body: String,
) -> AppResult<impl IntoResponse> {
    let catalog = state.catalog.replace(&body).await?;
    Ok(Json(DataResponse {
        data: catalog.as_ref().clone(),
    }))
}
