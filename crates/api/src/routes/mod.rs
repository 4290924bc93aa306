//! Route definitions, grouped by resource and assembled under `/api`.

pub mod files;
pub mod health;
pub mod jobs;
pub mod materials;
pub mod upload;

use axum::Router;

use crate::state::AppState;

/// All resource routes mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(upload::router())
        .merge(jobs::router())
        .merge(materials::router())
        .merge(files::router())
}
