use std::path::PathBuf;
use std::time::Duration;

use printflow_slicer::SlicerConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory where uploaded model files are stored.
    pub model_dir: PathBuf,
    /// Path of the persisted catalog JSON document.
    pub catalog_path: PathBuf,
    /// Slicer binary name or path.
    pub slicer_binary: String,
    /// Printer profile bundle passed to the slicer.
    pub slicer_profile: PathBuf,
    /// Deadline for a single slicer invocation, in seconds.
    pub slicer_timeout_secs: u64,
    /// Maximum printable dimension in millimetres.
    pub max_dimension_mm: f64,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// Number of retained job records before old terminal jobs are evicted.
    pub max_job_history: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `HOST`                 | `0.0.0.0`                |
    /// | `PORT`                 | `3000`                   |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                     |
    /// | `MODEL_DIR`            | `data/models`            |
    /// | `CATALOG_PATH`         | `data/catalog.json`      |
    /// | `SLICER_BINARY`        | `prusa-slicer`           |
    /// | `SLICER_PROFILE`       | `profiles/x1c.ini`       |
    /// | `SLICER_TIMEOUT_SECS`  | `300`                    |
    /// | `MAX_DIMENSION_MM`     | `256`                    |
    /// | `MAX_UPLOAD_BYTES`     | `52428800` (50 MiB)      |
    /// | `MAX_JOB_HISTORY`      | `1000`                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let model_dir = PathBuf::from(
            std::env::var("MODEL_DIR").unwrap_or_else(|_| "data/models".into()),
        );

        let catalog_path = PathBuf::from(
            std::env::var("CATALOG_PATH").unwrap_or_else(|_| "data/catalog.json".into()),
        );

        let slicer_binary =
            std::env::var("SLICER_BINARY").unwrap_or_else(|_| "prusa-slicer".into());

        let slicer_profile = PathBuf::from(
            std::env::var("SLICER_PROFILE").unwrap_or_else(|_| "profiles/x1c.ini".into()),
        );

        let slicer_timeout_secs: u64 = std::env::var("SLICER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("SLICER_TIMEOUT_SECS must be a valid u64");

        let max_dimension_mm: f64 = std::env::var("MAX_DIMENSION_MM")
            .unwrap_or_else(|_| "256".into())
            .parse()
            .expect("MAX_DIMENSION_MM must be a valid number");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "52428800".into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let max_job_history: usize = std::env::var("MAX_JOB_HISTORY")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("MAX_JOB_HISTORY must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            model_dir,
            catalog_path,
            slicer_binary,
            slicer_profile,
            slicer_timeout_secs,
            max_dimension_mm,
            max_upload_bytes,
            max_job_history,
        }
    }

    /// Slicer invocation settings derived from this configuration.
    pub fn slicer_config(&self) -> SlicerConfig {
        SlicerConfig {
            binary: self.slicer_binary.clone(),
            profile: self.slicer_profile.clone(),
            model_dir: self.model_dir.clone(),
            max_dimension_mm: self.max_dimension_mm,
            timeout: Duration::from_secs(self.slicer_timeout_secs),
        }
    }
}
