use axum::routing::get;
use axum::Router;

use crate::handlers::materials;
use crate::state::AppState;

/// ```text
/// GET  /materials -> get_materials
/// POST /materials -> replace_materials
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/materials",
        get(materials::get_materials).post(materials::replace_materials),
    )
}
