//! Status fetch abstraction
//!
//! The scheduler polls through this trait so the two tracking flows can
//! hit different endpoints and tests can script responses without a
//! backend.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TrackError;
use mathqa_client::BackendClient;
use mathqa_core::dto::batch::StatusUpdate;

/// One status fetch against a tracked job id.
#[async_trait]
pub trait StatusFetch: Send + Sync {
    async fn fetch_status(&self, id: &str) -> Result<StatusUpdate, TrackError>;
}

/// Fetches from the submission-flow progress endpoint.
pub struct ProgressFetch {
    client: Arc<BackendClient>,
}

impl ProgressFetch {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusFetch for ProgressFetch {
    async fn fetch_status(&self, id: &str) -> Result<StatusUpdate, TrackError> {
        let response = self
            .client
            .get_progress(id)
            .await
            .map_err(|e| TrackError::from_fetch(id, e))?;
        Ok(response.into())
    }
}

/// Fetches from the retrieve-by-id endpoint.
///
/// The endpoint names the progress counter `current_index`; the DTO
/// conversion normalizes it to the canonical `current`.
pub struct RetrieveFetch {
    client: Arc<BackendClient>,
}

impl RetrieveFetch {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusFetch for RetrieveFetch {
    async fn fetch_status(&self, id: &str) -> Result<StatusUpdate, TrackError> {
        let response = self
            .client
            .retrieve_batch(id)
            .await
            .map_err(|e| TrackError::from_fetch(id, e))?;
        Ok(response.into())
    }
}
