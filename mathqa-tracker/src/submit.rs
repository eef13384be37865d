//! Job submission
//!
//! Turns a problems CSV plus configuration into a submission call and a
//! job handle. Submission failures are never retried: the caller gets a
//! [`TrackError::Submit`] and surfaces the synthetic failed row built by
//! [`BatchJob::submit_failure`], so downstream consumers observe a
//! terminal signal even when polling never begins.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::TrackError;
use mathqa_client::{BackendClient, SubmitBatch};
use mathqa_core::domain::job::{BatchJob, JobStatus};

/// Bounds for `max_num_seqs` and `max_length`.
const LIMIT_RANGE: std::ops::RangeInclusive<u32> = 1..=100_000;

/// Submission parameters.
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    pub model_name: String,
    pub system_prompt: String,
    /// Predictions generated per problem; also the projection width.
    pub max_num_seqs: u32,
    /// Token budget per prediction.
    pub max_length: u32,
}

impl SubmitConfig {
    /// Check the configured limits before any network call.
    pub fn validate(&self) -> Result<(), TrackError> {
        if !LIMIT_RANGE.contains(&self.max_num_seqs) {
            return Err(TrackError::Submit(format!(
                "max_num_seqs must be within [{}, {}], got {}",
                LIMIT_RANGE.start(),
                LIMIT_RANGE.end(),
                self.max_num_seqs
            )));
        }
        if !LIMIT_RANGE.contains(&self.max_length) {
            return Err(TrackError::Submit(format!(
                "max_length must be within [{}, {}], got {}",
                LIMIT_RANGE.start(),
                LIMIT_RANGE.end(),
                self.max_length
            )));
        }
        Ok(())
    }
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            model_name: "casperhansen/deepseek-r1-distill-qwen-1.5b-awq".to_string(),
            system_prompt: "The final answer should be a non-negative integer after taking \
                            modulo 1000."
                .to_string(),
            max_num_seqs: 8,
            max_length: 14000,
        }
    }
}

/// Handle returned from a successful submission: the server-assigned id
/// plus the initial status (`started` or `waiting`).
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub id: String,
    pub status: JobStatus,
    pub total: Option<u64>,
}

impl JobHandle {
    /// The tracked job as of handle acquisition, ready to seed a poller.
    pub fn initial_job(&self) -> BatchJob {
        let mut job = BatchJob::new(&self.id, self.status);
        job.total = self.total;
        job
    }
}

/// Submits batches to the evaluation backend.
pub struct JobSubmitter {
    client: Arc<BackendClient>,
}

impl JobSubmitter {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }

    /// Submit a problems CSV for evaluation.
    ///
    /// # Arguments
    /// * `file` - Path to the CSV (`problem` and `answer` columns)
    /// * `config` - Model and sequence limits
    ///
    /// # Returns
    /// The job handle on success; [`TrackError::Submit`] on any
    /// validation or transport failure.
    pub async fn submit(&self, file: &Path, config: &SubmitConfig) -> Result<JobHandle, TrackError> {
        config.validate()?;

        let data = tokio::fs::read(file)
            .await
            .map_err(|e| TrackError::Submit(format!("failed to read {}: {}", file.display(), e)))?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "batch.csv".to_string());

        let response = self
            .client
            .submit_batch(SubmitBatch {
                file_name,
                data,
                model_name: config.model_name.clone(),
                system_prompt: config.system_prompt.clone(),
                max_num_seqs: config.max_num_seqs,
                max_length: config.max_length,
            })
            .await
            .map_err(|e| TrackError::Submit(e.to_string()))?;

        info!(
            batch = %response.batch_id,
            status = ?response.status,
            total = ?response.total,
            "batch submitted"
        );

        Ok(JobHandle {
            id: response.batch_id,
            status: response.status,
            total: response.total,
        })
    }
}
