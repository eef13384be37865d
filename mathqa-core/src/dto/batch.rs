//! Batch endpoint DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::{EvaluationResult, JobStatus};

/// Response to a batch submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    pub batch_id: String,
}

/// Status payload from the submission-flow progress endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub current: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub correct_so_far: Option<u64>,
    /// Partial text of the row currently being evaluated. Parsed for
    /// wire fidelity; the results list carries the tracked form.
    #[serde(default)]
    pub current_result: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<EvaluationResult>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Status payload from the retrieve-by-id endpoint.
///
/// Identical to [`ProgressResponse`] except the progress counter is
/// named `current_index` on this endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub current_index: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub correct_so_far: Option<u64>,
    #[serde(default)]
    pub results: Option<Vec<EvaluationResult>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Canonical status payload both endpoints normalize into.
///
/// `results: None` means the payload carried no result list (prior
/// results are kept); `Some(vec![])` is a genuine empty snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: JobStatus,
    pub current: Option<u64>,
    pub total: Option<u64>,
    pub correct_so_far: Option<u64>,
    pub results: Option<Vec<EvaluationResult>>,
    pub message: Option<String>,
}

impl StatusUpdate {
    /// A bare status change with no progress detail.
    pub fn status_only(status: JobStatus) -> Self {
        Self {
            status,
            current: None,
            total: None,
            correct_so_far: None,
            results: None,
            message: None,
        }
    }
}

impl From<ProgressResponse> for StatusUpdate {
    fn from(r: ProgressResponse) -> Self {
        Self {
            status: r.status,
            current: r.current,
            total: r.total,
            correct_so_far: r.correct_so_far,
            results: r.results,
            message: r.message,
        }
    }
}

impl From<RetrieveResponse> for StatusUpdate {
    fn from(r: RetrieveResponse) -> Self {
        Self {
            status: r.status,
            current: r.current_index,
            total: r.total,
            correct_so_far: r.correct_so_far,
            results: r.results,
            message: r.message,
        }
    }
}
