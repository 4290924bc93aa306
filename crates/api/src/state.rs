use std::sync::Arc;

use crate::catalog_store::CatalogStore;
use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::store::JobStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// In-memory job records.
    pub jobs: JobStore,
    /// Pricing catalog (JSON-file backed).
    pub catalog: Arc<CatalogStore>,
    /// Queue + single slicing worker.
    pub engine: Arc<Engine>,
}
