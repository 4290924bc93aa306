//! Background slicing worker.
//!
//! A single long-lived task drains the job queue one id at a time, so at
//! most one job is ever `processing` and the external slicer is never
//! invoked concurrently. A fault in one job marks that job failed and the
//! loop moves on; the loop itself only exits on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use printflow_core::job::{Job, JobResult, JobStatus, ModelSize};
use printflow_core::pricing::{price_job, PriceOutcome, PricingInputs};
use printflow_slicer::ModelSlicer;

use crate::catalog_store::CatalogStore;
use crate::engine::JobQueue;
use crate::store::JobStore;

/// How long an idle worker waits for a queue notification per tick.
const IDLE_WAIT: Duration = Duration::from_secs(1);

/// Background job worker.
///
/// Owns one end of the queue for the lifetime of its `run` call.
pub struct Dispatcher {
    queue: Arc<JobQueue>,
    jobs: JobStore,
    catalog: Arc<CatalogStore>,
    slicer: Arc<dyn ModelSlicer>,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<JobQueue>,
        jobs: JobStore,
        catalog: Arc<CatalogStore>,
        slicer: Arc<dyn ModelSlicer>,
    ) -> Self {
        Self {
            queue,
            jobs,
            catalog,
            slicer,
        }
    }

    /// Run the worker loop until the cancellation token is triggered.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!("Slicing worker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Slicing worker shutting down");
                    break;
                }
                popped = self.queue.pop_timeout(IDLE_WAIT) => {
                    // None is just an idle tick on an empty queue.
                    if let Some(id) = popped {
                        self.dispatch(id).await;
                    }
                }
            }
        }
    }

    /// Process one dequeued job id end to end.
    async fn dispatch(&self, id: Uuid) {
        let job = match self
            .jobs
            .transition(id, JobStatus::Processing, |_| {})
            .await
        {
            Ok(job) => job,
            Err(e) => {
                // Unknown or already-moved id (e.g. evicted); skip it.
                tracing::warn!(job_id = %id, error = %e, "Skipping queued job");
                return;
            }
        };

        tracing::info!(job_id = %id, filename = %job.filename, "Slicing job started");

        match self.process(&job).await {
            Ok(result) => {
                let updated = self
                    .jobs
                    .transition(id, JobStatus::Completed, |j| j.result = Some(result))
                    .await;
                match updated {
                    Ok(_) => tracing::info!(job_id = %id, "Slicing job completed"),
                    Err(e) => tracing::error!(job_id = %id, error = %e, "Could not record job result"),
                }
            }
            Err(message) => {
                tracing::warn!(job_id = %id, error = %message, "Slicing job failed");
                let failed = self
                    .jobs
                    .transition(id, JobStatus::Failed, |j| j.error = Some(message))
                    .await;
                if let Err(e) = failed {
                    tracing::error!(job_id = %id, error = %e, "Could not record job failure");
                }
            }
        }
    }

    /// Slice and price one job. Any error fails the job with its message;
    /// pricing errors do not count as errors here, they are embedded in
    /// the result instead.
    async fn process(&self, job: &Job) -> Result<JobResult, String> {
        let catalog = self.catalog.snapshot().await;
        let fill_density = job
            .fill_density
            .unwrap_or(catalog.global_settings.default_fill_density);

        let sliced = self
            .slicer
            .slice(&job.filename, fill_density, job.enable_supports)
            .await
            .map_err(|e| e.to_string())?;

        let price = match price_job(
            &catalog,
            &PricingInputs {
                material_id: &job.material_id,
                color_id: &job.color_id,
                filament_used_g: sliced.filament_used_g,
                estimated_time: &sliced.estimated_time,
                enable_supports: job.enable_supports,
                quality_id: job.quality_id.as_deref(),
            },
        ) {
            Ok(breakdown) => PriceOutcome::Priced(breakdown),
            Err(e) => {
                // Slicing succeeded; a quote we cannot price still completes
                // with the error carried in the result.
                tracing::warn!(job_id = %job.id, error = %e, "Pricing failed");
                PriceOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        Ok(JobResult {
            filament_used_g: sliced.filament_used_g,
            estimated_time: sliced.estimated_time,
            size: ModelSize {
                x: sliced.size_x,
                y: sliced.size_y,
                z: sliced.size_z,
            },
            volume_cm3: sliced.volume_cm3,
            fill_density,
            has_supports: sliced.has_supports,
            price,
        })
    }
}
