//! Error types for the job tracker

use thiserror::Error;

use mathqa_client::ClientError;

/// Errors produced while tracking a batch job.
///
/// Every failure path leaves the tracked job in an observable terminal
/// state: submission failures surface the synthetic error row, and
/// fetch failures stop the scheduler and mark the job `error`.
#[derive(Debug, Error)]
pub enum TrackError {
    /// Transport or validation failure during submission. Never
    /// retried; the flow aborts with one synthetic failed row.
    #[error("batch submission failed: {0}")]
    Submit(String),

    /// Transport failure while polling a tracked job. Stops the
    /// scheduler for that id; no retry, no backoff.
    #[error("status fetch failed for job {id}: {reason}")]
    PollFetch { id: String, reason: String },

    /// Response arrived but its shape did not match the expected
    /// payload. Handled exactly like a fetch failure.
    #[error("malformed status payload for job {id}: {reason}")]
    MalformedPayload { id: String, reason: String },
}

impl TrackError {
    /// Classify a client error encountered during a status fetch.
    pub fn from_fetch(id: &str, err: ClientError) -> Self {
        if err.is_decode() {
            Self::MalformedPayload {
                id: id.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::PollFetch {
                id: id.to_string(),
                reason: err.to_string(),
            }
        }
    }
}
