//! Chat endpoint DTOs
//!
//! The chat endpoint streams line-delimited `data: <json>` frames and
//! closes with a literal `[DONE]` sentinel.

use serde::{Deserialize, Serialize};

/// Request body for the streaming chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// One streamed text fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChunk {
    pub content: String,
}
