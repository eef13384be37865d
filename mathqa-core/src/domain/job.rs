//! Batch job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a batch evaluation job.
///
/// The status only moves forward along
/// `Waiting -> Started -> InProgress -> Completed`; any non-terminal
/// status may jump to `Error`. `Completed` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Waiting,
    Started,
    InProgress,
    Completed,
    Error,
}

impl JobStatus {
    /// Whether no further transitions are permitted from this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Whether a transition from `self` to `next` is a permitted edge.
    ///
    /// Equal or earlier statuses are not an error, they are simply not
    /// applied (the server may legitimately resend an older snapshot).
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobStatus::Error {
            return true;
        }
        next.rank() > self.rank()
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Waiting => 0,
            JobStatus::Started => 1,
            JobStatus::InProgress => 2,
            JobStatus::Completed => 3,
            // Error is reachable from any non-terminal status, never by rank
            JobStatus::Error => 4,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Started => "started",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// One model prediction for a problem: the extracted answer and the
/// number of tokens the model spent producing it.
///
/// The backend encodes these as two-element JSON arrays
/// (`["42", 1837]`), so the wire shape is a tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, u64)", into = "(String, u64)")]
pub struct Prediction {
    pub answer: String,
    pub num_tokens: u64,
}

impl From<(String, u64)> for Prediction {
    fn from((answer, num_tokens): (String, u64)) -> Self {
        Self { answer, num_tokens }
    }
}

impl From<Prediction> for (String, u64) {
    fn from(p: Prediction) -> Self {
        (p.answer, p.num_tokens)
    }
}

/// Evaluation outcome for a single problem row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub id: String,
    pub problem: String,
    pub true_answer: String,
    pub predicted_answer: String,
    /// All per-sequence predictions, in server order.
    #[serde(rename = "extracted_answers", default)]
    pub predictions: Vec<Prediction>,
    /// Per-row progress marker (e.g. `"3/10"`).
    #[serde(default)]
    pub progress: Option<String>,
}

/// The canonical tracked view of one server-side batch job.
///
/// Created the instant a submission or retrieval call returns an id,
/// mutated exclusively through the tracker's reconciler, and dropped
/// from tracking once the poll scheduler stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    /// Opaque server-assigned identifier; immutable once set.
    pub id: String,
    pub status: JobStatus,
    pub total: Option<u64>,
    pub current: Option<u64>,
    pub correct_so_far: Option<u64>,
    pub message: Option<String>,
    /// Full result snapshot; replaced wholesale on each merge that
    /// carries a result list.
    pub results: Vec<EvaluationResult>,
    /// When the last merge was applied.
    pub updated_at: DateTime<Utc>,
}

impl BatchJob {
    /// Create a freshly tracked job from a server-assigned id.
    pub fn new(id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            total: None,
            current: None,
            correct_so_far: None,
            message: None,
            results: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Terminal job representing a submission that never reached the
    /// backend. Carries exactly one synthetic failed row with the stable
    /// literal id `"Error"` so downstream consumers always observe a
    /// terminal signal even without polling.
    pub fn submit_failure(message: impl Into<String>) -> Self {
        let mut job = Self::new("Error", JobStatus::Error);
        job.message = Some(message.into());
        job.results = vec![EvaluationResult {
            id: "Error".to_string(),
            problem: "Error".to_string(),
            true_answer: "Error".to_string(),
            predicted_answer: "Failed to process batch".to_string(),
            predictions: Vec::new(),
            progress: Some("0/0".to_string()),
        }];
        job
    }

    /// Bump the last-modified timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        let parsed: JobStatus = serde_json::from_str("\"waiting\"").unwrap();
        assert_eq!(parsed, JobStatus::Waiting);
        assert_eq!(JobStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_status_advances_forward_only() {
        assert!(JobStatus::Waiting.can_advance_to(JobStatus::Started));
        assert!(JobStatus::Waiting.can_advance_to(JobStatus::InProgress));
        assert!(JobStatus::Started.can_advance_to(JobStatus::Completed));
        assert!(!JobStatus::InProgress.can_advance_to(JobStatus::Started));
        assert!(!JobStatus::InProgress.can_advance_to(JobStatus::InProgress));
    }

    #[test]
    fn test_error_reachable_from_any_non_terminal() {
        assert!(JobStatus::Waiting.can_advance_to(JobStatus::Error));
        assert!(JobStatus::Started.can_advance_to(JobStatus::Error));
        assert!(JobStatus::InProgress.can_advance_to(JobStatus::Error));
    }

    #[test]
    fn test_terminal_states_are_frozen() {
        assert!(!JobStatus::Completed.can_advance_to(JobStatus::Error));
        assert!(!JobStatus::Error.can_advance_to(JobStatus::Completed));
        assert!(!JobStatus::Completed.can_advance_to(JobStatus::InProgress));
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_prediction_wire_shape_is_a_tuple() {
        let parsed: Vec<Prediction> =
            serde_json::from_str(r#"[["42", 1837], ["", 14000]]"#).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].answer, "42");
        assert_eq!(parsed[0].num_tokens, 1837);
        assert_eq!(parsed[1].answer, "");

        let encoded = serde_json::to_string(&parsed[0]).unwrap();
        assert_eq!(encoded, r#"["42",1837]"#);
    }

    #[test]
    fn test_submit_failure_is_terminal_with_synthetic_row() {
        let job = BatchJob::submit_failure("connection refused");
        assert_eq!(job.status, JobStatus::Error);
        assert!(job.status.is_terminal());
        assert_eq!(job.results.len(), 1);
        assert_eq!(job.results[0].id, "Error");
        assert_eq!(job.results[0].predicted_answer, "Failed to process batch");
        assert_eq!(job.results[0].progress.as_deref(), Some("0/0"));
        assert!(job.results[0].predictions.is_empty());
        assert_eq!(job.message.as_deref(), Some("connection refused"));
    }
}
