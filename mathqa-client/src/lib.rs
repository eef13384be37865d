//! MathQA Backend Client
//!
//! A type-safe HTTP client for the batch evaluation backend.
//!
//! The backend is treated as an opaque service: this crate knows its
//! endpoints and wire shapes (submit, progress, retrieve, chat) and
//! nothing about how jobs execute. Both the tracker and the CLI go
//! through this client, so endpoint details live in exactly one place.
//!
//! # Example
//!
//! ```no_run
//! use mathqa_client::BackendClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mathqa_client::ClientError> {
//!     let client = BackendClient::new("http://localhost:8000");
//!     let progress = client.get_progress("batch-af31").await?;
//!     println!("status: {:?}", progress.status);
//!     Ok(())
//! }
//! ```

pub mod error;
mod batches;
mod chat;

// Re-export commonly used types
pub use batches::SubmitBatch;
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the evaluation backend API
///
/// Covers the full backend surface:
/// - Batch submission (multipart upload)
/// - Progress polling and retrieval by id
/// - Streaming chat
#[derive(Debug, Clone)]
pub struct BackendClient {
    /// Base URL of the backend (e.g., "http://localhost:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl BackendClient {
    /// Create a new backend client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the backend API (e.g., "http://localhost:8000")
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a new backend client with a custom HTTP client
    ///
    /// This allows configuring timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle an API response and deserialize JSON
    ///
    /// Checks the status code and returns an appropriate error if the
    /// request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("invalid JSON response: {}", e)))
    }
}
