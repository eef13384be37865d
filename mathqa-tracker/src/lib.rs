//! MathQA Job Tracker
//!
//! The client-side lifecycle controller for server-executed batch
//! evaluation jobs. The backend runs the evaluation; this crate submits
//! a job, polls its status until a terminal state, and reconciles every
//! response into a single monotonically-advancing [`BatchJob`] view.
//!
//! Components:
//! - [`submit::JobSubmitter`]: turns a CSV file plus configuration into
//!   a submission call and a job handle
//! - [`scheduler::PollScheduler`]: owns the single active poller per
//!   job id and decides, per tracking mode, when to stop
//! - [`reconcile`]: merges status payloads under a snapshot-replace
//!   policy
//! - [`feed::JobFeed`]: publishes immutable job snapshots to listeners
//! - [`project::ResultProjector`]: fixed-width row/column view for
//!   display and CSV export
//!
//! [`BatchJob`]: mathqa_core::domain::job::BatchJob

pub mod error;
pub mod feed;
pub mod fetch;
pub mod project;
pub mod reconcile;
pub mod scheduler;
pub mod submit;

pub use error::TrackError;
pub use scheduler::{PollHandle, PollScheduler, TrackingMode};
