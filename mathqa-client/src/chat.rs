//! Streaming chat endpoint
//!
//! The backend streams `data: <json>` lines and terminates the stream
//! with a literal `data: [DONE]` frame.

use futures_util::StreamExt;
use tracing::warn;

use crate::BackendClient;
use crate::error::{ClientError, Result};
use mathqa_core::dto::chat::{ChatChunk, ChatRequest};

/// One decoded frame of the chat stream.
#[derive(Debug, PartialEq)]
enum ChatEvent {
    Delta(String),
    Done,
}

/// Decode a single stream line.
///
/// Lines without the `data: ` prefix (keep-alives, blank separators) and
/// frames that fail to decode yield `None`; the stream continues.
fn parse_stream_line(line: &str) -> Option<ChatEvent> {
    let data = line.strip_prefix("data: ")?;
    if data.trim() == "[DONE]" {
        return Some(ChatEvent::Done);
    }
    match serde_json::from_str::<ChatChunk>(data) {
        Ok(chunk) => Some(ChatEvent::Delta(chunk.content)),
        Err(e) => {
            warn!(error = %e, "skipping undecodable chat frame");
            None
        }
    }
}

impl BackendClient {
    /// Send a chat message and stream the reply
    ///
    /// Invokes `on_delta` once per received text fragment and returns
    /// the full concatenated reply once the `[DONE]` sentinel arrives
    /// or the stream ends.
    ///
    /// # Arguments
    /// * `message` - The user message
    /// * `on_delta` - Callback invoked with each text fragment
    pub async fn chat_stream<F>(&self, message: &str, mut on_delta: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let url = format!("{}/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api(status.as_u16(), error_text));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut reply = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            // Frames are line-delimited; a chunk may carry several lines
            // or end mid-line, so only complete lines are decoded.
            while let Some(newline) = buffer.find('\n') {
                let line: String = buffer.drain(..=newline).collect();
                match parse_stream_line(line.trim_end()) {
                    Some(ChatEvent::Delta(text)) => {
                        on_delta(&text);
                        reply.push_str(&text);
                    }
                    Some(ChatEvent::Done) => return Ok(reply),
                    None => {}
                }
            }
        }

        Ok(reply)
    }
}
