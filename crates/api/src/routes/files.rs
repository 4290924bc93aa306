use axum::routing::get;
use axum::Router;

use crate::handlers::files;
use crate::state::AppState;

/// ```text
/// GET /file/{name} -> get_file
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/file/{name}", get(files::get_file))
}
