//! JSON-file backed catalog store.
//!
//! The catalog is loaded once at startup and kept in memory behind an
//! `RwLock<Arc<...>>`: readers (pricing, the materials endpoint) take a
//! cheap `Arc` snapshot that stays consistent even if an admin replace
//! lands mid-job. Replacement validates the incoming document fully
//! before anything touches disk, then persists via write-to-temp +
//! rename so the stored file is never left corrupt.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use printflow_core::catalog::Catalog;
use printflow_core::error::CoreError;

pub struct CatalogStore {
    path: PathBuf,
    current: RwLock<Arc<Catalog>>,
}

impl CatalogStore {
    /// Load the catalog from `path`, seeding the file with the compiled-in
    /// defaults when it does not exist yet.
    ///
    /// An existing-but-unreadable document falls back to the defaults
    /// without overwriting the file on disk.
    pub async fn load_or_seed(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let catalog = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<Catalog>(&raw) {
                Ok(catalog) => {
                    tracing::info!(path = %path.display(), "Loaded catalog");
                    catalog
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Could not parse persisted catalog, using defaults"
                    );
                    Catalog::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let catalog = Catalog::default();
                if let Err(e) = persist(&path, &catalog).await {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Could not seed catalog file"
                    );
                } else {
                    tracing::info!(path = %path.display(), "Seeded default catalog");
                }
                catalog
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not read persisted catalog, using defaults"
                );
                Catalog::default()
            }
        };

        Self {
            path,
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Consistent point-in-time snapshot of the catalog.
    pub async fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the catalog wholesale from a raw JSON document.
    ///
    /// The document must parse and pass [`Catalog::validate`] before the
    /// persisted file or the in-memory snapshot is touched; a rejected
    /// replacement leaves both exactly as they were.
    pub async fn replace(&self, raw: &str) -> Result<Arc<Catalog>, CoreError> {
        let catalog: Catalog = serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("Invalid catalog document: {e}")))?;
        catalog.validate()?;

        // Hold the write lock across the disk write so concurrent replaces
        // cannot interleave file and snapshot states.
        let mut current = self.current.write().await;
        persist(&self.path, &catalog)
            .await
            .map_err(|e| CoreError::Internal(format!("Could not persist catalog: {e}")))?;

        let catalog = Arc::new(catalog);
        *current = Arc::clone(&catalog);
        tracing::info!(
            materials = catalog.materials.len(),
            "Catalog replaced"
        );
        Ok(catalog)
    }
}

/// Write the catalog atomically: serialize to a sibling temp file, then
/// rename over the target.
async fn persist(path: &Path, catalog: &Catalog) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let json = serde_json::to_string_pretty(catalog)
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
