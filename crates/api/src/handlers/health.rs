use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// GET /health
///
/// Liveness probe: the process is up and serving requests.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
