//! Job record and lifecycle state machine.
//!
//! A job is one slicing + pricing request. Its status moves through
//! `pending -> processing -> {completed | failed}`, and a completed job
//! may be approved or rejected by an operator. `failed`, `approved`, and
//! `rejected` are terminal. Every status mutation must go through
//! [`JobStatus::can_transition`] so the graph is enforced in one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::PriceOutcome;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Approved,
    Rejected,
}

impl JobStatus {
    /// Whether a transition from `self` to `to` is allowed.
    pub fn can_transition(self, to: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, to),
            (Pending, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Completed, Approved)
                | (Completed, Rejected)
        )
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Failed | JobStatus::Approved | JobStatus::Rejected
        )
    }

    /// Wire/label form, matching the serialized representation.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Approved => "approved",
            JobStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job record
// ---------------------------------------------------------------------------

/// Bounding-box dimensions of a model in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelSize {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Outcome of a successful slice, merged with the price calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub filament_used_g: f64,
    /// Compound duration string as reported by the slicer.
    pub estimated_time: String,
    pub size: ModelSize,
    pub volume_cm3: f64,
    /// Infill fraction the model was actually sliced with.
    pub fill_density: f64,
    pub has_supports: bool,
    /// Price breakdown, or an embedded pricing error. A pricing error does
    /// not fail the job: slicing already succeeded.
    pub price: PriceOutcome,
}

/// One print request and its lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Name of the stored model file on disk.
    pub filename: String,
    /// Name the customer uploaded the file under. Display only.
    pub original_filename: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    pub material_id: String,
    pub color_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_id: Option<String>,
    /// Requested infill fraction. `None` means the catalog default applies
    /// at slice time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_density: Option<f64>,
    pub enable_supports: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Create a new pending job for a stored model file.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        filename: String,
        original_filename: String,
        material_id: String,
        color_id: String,
        quality_id: Option<String>,
        fill_density: Option<f64>,
        enable_supports: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            original_filename,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            approved_at: None,
            rejected_at: None,
            material_id,
            color_id,
            quality_id,
            fill_density,
            enable_supports,
            result: None,
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use JobStatus::*;

    const ALL: [JobStatus; 6] = [Pending, Processing, Completed, Failed, Approved, Rejected];

    // -- transition graph -----------------------------------------------------

    #[test]
    fn allowed_transitions() {
        assert!(Pending.can_transition(Processing));
        assert!(Processing.can_transition(Completed));
        assert!(Processing.can_transition(Failed));
        assert!(Completed.can_transition(Approved));
        assert!(Completed.can_transition(Rejected));
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        for from in [Failed, Approved, Rejected] {
            for to in ALL {
                assert!(!from.can_transition(to), "{from} -> {to} must be denied");
            }
        }
    }

    #[test]
    fn no_skipping_processing() {
        assert!(!Pending.can_transition(Completed));
        assert!(!Pending.can_transition(Failed));
        assert!(!Pending.can_transition(Approved));
    }

    #[test]
    fn no_approval_before_completion() {
        assert!(!Processing.can_transition(Approved));
        assert!(!Processing.can_transition(Rejected));
    }

    #[test]
    fn no_self_transitions() {
        for status in ALL {
            assert!(!status.can_transition(status));
        }
    }

    #[test]
    fn terminal_flags() {
        assert!(Failed.is_terminal());
        assert!(Approved.is_terminal());
        assert!(Rejected.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!Processing.is_terminal());
        assert!(!Completed.is_terminal());
    }

    // -- serialization --------------------------------------------------------

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Pending).unwrap(), "\"pending\"");
        assert_eq!(serde_json::to_string(&Approved).unwrap(), "\"approved\"");
    }

    #[test]
    fn new_job_is_pending_with_no_result() {
        let job = Job::new(
            "abc_model.stl".to_string(),
            "model.stl".to_string(),
            "pla".to_string(),
            "black".to_string(),
            None,
            Some(0.2),
            false,
        );
        assert_eq!(job.status, Pending);
        assert!(job.result.is_none());
        assert!(job.error.is_none());
        assert!(job.approved_at.is_none());
    }

    #[test]
    fn optional_fields_omitted_from_json() {
        let job = Job::new(
            "abc_model.stl".to_string(),
            "model.stl".to_string(),
            "pla".to_string(),
            "black".to_string(),
            None,
            None,
            false,
        );
        let json = serde_json::to_value(&job).unwrap();
        assert!(json.get("result").is_none());
        assert!(json.get("error").is_none());
        assert!(json.get("quality_id").is_none());
        assert!(json.get("fill_density").is_none());
    }
}
