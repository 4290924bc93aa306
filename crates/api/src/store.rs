//! In-memory job store.
//!
//! Job records live for the process lifetime only. The store is owned,
//! injected state shared between the HTTP handlers (reads, approve/reject)
//! and the slicing worker (status + result writes); every mutation takes
//! the write lock so an update is fully applied or not at all, and every
//! status change is checked against the transition graph.
//!
//! Retention is bounded: once the store holds more than `max_history`
//! records, the oldest jobs in a terminal state are evicted. Jobs still
//! pending or processing are never evicted.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use printflow_core::error::CoreError;
use printflow_core::job::{Job, JobStatus};

#[derive(Clone)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<Uuid, Job>>>,
    max_history: usize,
}

impl JobStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            max_history: max_history.max(1),
        }
    }

    /// Insert a freshly created job, evicting old terminal jobs beyond the
    /// retention cap.
    pub async fn insert(&self, job: Job) {
        let mut map = self.inner.write().await;
        map.insert(job.id, job);

        while map.len() > self.max_history {
            let oldest_terminal = map
                .values()
                .filter(|j| j.status.is_terminal())
                .min_by_key(|j| (j.created_at, j.id))
                .map(|j| j.id);
            match oldest_terminal {
                Some(id) => {
                    map.remove(&id);
                    tracing::debug!(job_id = %id, "Evicted old job record");
                }
                // Everything left is still active; retention waits.
                None => break,
            }
        }
    }

    /// Snapshot of a single job.
    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Snapshot of all jobs, newest first.
    pub async fn list(&self) -> Vec<Job> {
        let map = self.inner.read().await;
        let mut jobs: Vec<Job> = map.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        jobs
    }

    /// Move a job to a new status and apply an extra mutation (result,
    /// error, timestamps) under the same write lock.
    ///
    /// Fails with `Conflict` when the transition graph forbids the move
    /// and `NotFound` when the job does not exist (e.g. evicted).
    pub async fn transition<F>(&self, id: Uuid, to: JobStatus, apply: F) -> Result<Job, CoreError>
    where
        F: FnOnce(&mut Job),
    {
        let mut map = self.inner.write().await;
        let job = map.get_mut(&id).ok_or(CoreError::NotFound {
            entity: "Job",
            id: id.to_string(),
        })?;

        if !job.status.can_transition(to) {
            return Err(CoreError::Conflict(format!(
                "Cannot move job from '{}' to '{}'",
                job.status, to
            )));
        }

        job.status = to;
        apply(job);
        Ok(job.clone())
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
