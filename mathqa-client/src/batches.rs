//! Batch submission and status endpoints

use reqwest::multipart;
use tracing::debug;

use crate::BackendClient;
use crate::error::Result;
use mathqa_core::dto::batch::{ProgressResponse, RetrieveResponse, SubmitResponse};

/// Everything the submit endpoint needs for one batch.
///
/// `file_name`/`data` travel as the multipart file part, `model_name`
/// and `system_prompt` as plain form fields, and the sequence limits as
/// query parameters (the backend reads them outside the form body).
#[derive(Debug, Clone)]
pub struct SubmitBatch {
    pub file_name: String,
    pub data: Vec<u8>,
    pub model_name: String,
    pub system_prompt: String,
    pub max_num_seqs: u32,
    pub max_length: u32,
}

impl BackendClient {
    /// Submit a CSV of problems for batch evaluation
    ///
    /// # Arguments
    /// * `req` - The batch submission request
    ///
    /// # Returns
    /// The server-assigned job handle (id, initial status, optional total)
    pub async fn submit_batch(&self, req: SubmitBatch) -> Result<SubmitResponse> {
        let url = format!("{}/batch", self.base_url);

        debug!(
            file = %req.file_name,
            max_num_seqs = req.max_num_seqs,
            max_length = req.max_length,
            "submitting batch"
        );

        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(req.data).file_name(req.file_name),
            )
            .text("model_name", req.model_name)
            .text("system_prompt", req.system_prompt);

        let response = self
            .client
            .post(&url)
            .query(&[
                ("max_num_seqs", req.max_num_seqs),
                ("max_length", req.max_length),
            ])
            .multipart(form)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch progress for a job created through [`submit_batch`](Self::submit_batch)
    ///
    /// # Arguments
    /// * `batch_id` - The server-assigned job id
    pub async fn get_progress(&self, batch_id: &str) -> Result<ProgressResponse> {
        let url = format!("{}/batch/{}/progress", self.base_url, batch_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Retrieve a job by arbitrary id (reconnection after a restart)
    ///
    /// This endpoint reports the progress counter as `current_index`;
    /// the DTO conversion normalizes it.
    ///
    /// # Arguments
    /// * `id` - The job id to look up
    pub async fn retrieve_batch(&self, id: &str) -> Result<RetrieveResponse> {
        let url = format!("{}/batch/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
