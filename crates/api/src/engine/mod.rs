//! Job queue and slicing engine.
//!
//! Submissions enqueue job ids; a single long-lived worker task drains
//! the queue and runs the slice + price pipeline for one job at a time,
//! which keeps the external slicer exclusive. The worker is respawned
//! lazily by the submission path if it ever dies, over the same queue,
//! so queued ids survive a worker crash.

pub mod dispatcher;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use printflow_slicer::ModelSlicer;

use crate::catalog_store::CatalogStore;
use crate::store::JobStore;
use dispatcher::Dispatcher;

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// Thread-safe FIFO of job ids.
///
/// Producers push and never block; the single consumer waits on a
/// [`Notify`] with a timeout instead of busy-spinning. An empty-queue
/// timeout is a normal idle tick, not an error.
#[derive(Default)]
pub struct JobQueue {
    queue: Mutex<VecDeque<Uuid>>,
    notify: Notify,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a job id and wake the worker.
    pub fn push(&self, id: Uuid) {
        self.queue
            .lock()
            .expect("job queue mutex poisoned")
            .push_back(id);
        self.notify.notify_one();
    }

    fn try_pop(&self) -> Option<Uuid> {
        self.queue
            .lock()
            .expect("job queue mutex poisoned")
            .pop_front()
    }

    /// Dequeue the next id, waiting up to `wait` when the queue is empty.
    pub async fn pop_timeout(&self, wait: Duration) -> Option<Uuid> {
        if let Some(id) = self.try_pop() {
            return Some(id);
        }
        // Whether the notification arrived or the wait elapsed, one more
        // look at the queue settles it.
        let _ = tokio::time::timeout(wait, self.notify.notified()).await;
        self.try_pop()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().expect("job queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns the queue, the slicer boundary, and the worker task handle.
pub struct Engine {
    queue: Arc<JobQueue>,
    jobs: JobStore,
    catalog: Arc<CatalogStore>,
    slicer: Arc<dyn ModelSlicer>,
    worker: Mutex<Option<tokio::task::JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(jobs: JobStore, catalog: Arc<CatalogStore>, slicer: Arc<dyn ModelSlicer>) -> Arc<Self> {
        Arc::new(Self {
            queue: Arc::new(JobQueue::new()),
            jobs,
            catalog,
            slicer,
            worker: Mutex::new(None),
            cancel: CancellationToken::new(),
        })
    }

    /// Enqueue a job for slicing, making sure a worker is alive to drain it.
    pub fn submit(&self, id: Uuid) {
        self.queue.push(id);
        self.ensure_worker();
    }

    /// Spawn the worker task if none is running.
    ///
    /// Called at startup and again on every submission: should the worker
    /// ever die, the next submission revives it over the same queue and no
    /// queued id is lost.
    pub fn ensure_worker(&self) {
        let mut worker = self.worker.lock().expect("worker handle mutex poisoned");
        let alive = worker.as_ref().is_some_and(|h| !h.is_finished());
        if alive {
            return;
        }
        if worker.is_some() {
            tracing::warn!("Slicing worker was not running, respawning");
        }

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.queue),
            self.jobs.clone(),
            Arc::clone(&self.catalog),
            Arc::clone(&self.slicer),
        );
        let cancel = self.cancel.clone();
        *worker = Some(tokio::spawn(dispatcher.run(cancel)));
    }

    /// Stop the worker and wait briefly for it to wind down.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self
            .worker
            .lock()
            .expect("worker handle mutex poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
    }

    /// Number of ids waiting to be dispatched.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
