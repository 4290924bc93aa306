#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use printflow_api::catalog_store::CatalogStore;
use printflow_api::config::ServerConfig;
use printflow_api::engine::Engine;
use printflow_api::routes;
use printflow_api::state::AppState;
use printflow_api::store::JobStore;
use printflow_slicer::{ModelSlicer, SliceOutcome, SlicerError};

/// Scripted slicer: the behaviour is chosen by marker substrings in the
/// stored filename, and concurrent invocations are counted so tests can
/// assert slicing never overlaps.
///
/// - `oversized` -> build-volume rejection
/// - `toolfail`  -> tool execution failure
/// - anything else -> a fixed successful slice (14.73 g, "5h 12m 30s")
pub struct MockSlicer {
    delay: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockSlicer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Highest number of slices observed in flight at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelSlicer for MockSlicer {
    async fn slice(
        &self,
        filename: &str,
        _fill_density: f64,
        enable_supports: bool,
    ) -> Result<SliceOutcome, SlicerError> {
        let in_flight = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(in_flight, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        let result = if filename.contains("oversized") {
            Err(SlicerError::Oversized {
                size_x: 300.0,
                size_y: 120.0,
                size_z: 80.0,
                max_dimension: 256.0,
            })
        } else if filename.contains("toolfail") {
            Err(SlicerError::ExecutionFailed {
                exit_code: Some(1),
                stderr: "Slicing failed".to_string(),
            })
        } else {
            Ok(SliceOutcome {
                size_x: 120.5,
                size_y: 80.25,
                size_z: 45.0,
                volume_cm3: 52.34,
                filament_used_g: 14.73,
                estimated_time: "5h 12m 30s".to_string(),
                has_supports: enable_supports,
            })
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// A fully wired application over temp storage and the mock slicer.
pub struct TestApp {
    pub app: Router,
    pub slicer: Arc<MockSlicer>,
    pub state: AppState,
    /// Keeps the temp model dir and catalog file alive for the test.
    pub tmp: tempfile::TempDir,
}

impl TestApp {
    pub fn catalog_path(&self) -> std::path::PathBuf {
        self.state.config.catalog_path.clone()
    }
}

/// Build the application the way `main.rs` does, minus the network
/// listener, with the given slice duration.
pub async fn spawn_app(slice_delay: Duration) -> TestApp {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let model_dir = tmp.path().join("models");
    tokio::fs::create_dir_all(&model_dir)
        .await
        .expect("create model dir");

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        model_dir,
        catalog_path: tmp.path().join("catalog.json"),
        slicer_binary: "prusa-slicer".to_string(),
        slicer_profile: tmp.path().join("profile.ini"),
        slicer_timeout_secs: 300,
        max_dimension_mm: 256.0,
        max_upload_bytes: 10 * 1024 * 1024,
        max_job_history: 100,
    };

    let catalog = Arc::new(CatalogStore::load_or_seed(config.catalog_path.clone()).await);
    let jobs = JobStore::new(config.max_job_history);
    let slicer = Arc::new(MockSlicer::new(slice_delay));
    let engine = Engine::new(
        jobs.clone(),
        Arc::clone(&catalog),
        Arc::clone(&slicer) as Arc<dyn ModelSlicer>,
    );
    engine.ensure_worker();

    let state = AppState {
        config: Arc::new(config),
        jobs,
        catalog,
        engine,
    };

    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api", routes::api_routes())
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state.clone());

    TestApp {
        app,
        slicer,
        state,
        tmp,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json_text(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

const BOUNDARY: &str = "------printflow-test-boundary";

/// Multipart upload request with a small STL payload under `filename`
/// plus the given form fields.
pub fn multipart_upload(filename: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    body.push_str(&format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
         filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n\
         solid cube\nendsolid cube\n\r\n"
    ));
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Multipart request carrying only form fields, no file part.
pub fn multipart_fields_only(fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Send a request and return the status plus parsed JSON body (Null for
/// an empty or non-JSON body).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Upload a model and return its job id.
pub async fn upload_model(
    app: &Router,
    filename: &str,
    fields: &[(&str, &str)],
) -> String {
    let (status, body) = send(app, multipart_upload(filename, fields)).await;
    assert_eq!(status, StatusCode::ACCEPTED, "upload rejected: {body}");
    assert_eq!(body["status"], "pending");
    body["job_id"].as_str().expect("job_id in response").to_string()
}

/// Poll a job until it leaves `pending`/`processing`, panicking after
/// `deadline`.
pub async fn wait_for_settled_job(
    app: &Router,
    job_id: &str,
    deadline: Duration,
) -> serde_json::Value {
    let start = Instant::now();
    loop {
        let (status, body) = send(app, get(&format!("/api/job/{job_id}"))).await;
        assert_eq!(status, StatusCode::OK, "job lookup failed: {body}");
        let job = body["data"].clone();
        let job_status = job["status"].as_str().expect("job has a status");
        if !matches!(job_status, "pending" | "processing") {
            return job;
        }
        assert!(
            start.elapsed() < deadline,
            "job {job_id} still {job_status} after {deadline:?}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Standard submission fields: default PLA in black.
pub fn pla_black() -> Vec<(&'static str, &'static str)> {
    vec![
        ("material_id", "pla"),
        ("color_id", "black"),
        ("fill_density", "0.15"),
        ("enable_supports", "false"),
    ]
}
