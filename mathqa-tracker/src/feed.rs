//! Snapshot publishing
//!
//! The tracker never lets consumers observe partial mutations: each
//! applied merge produces a complete [`BatchJob`] value which is
//! published here. Rendering and export are external consumers of the
//! feed, not part of the controller.

use tokio::sync::watch;

use mathqa_core::domain::job::BatchJob;

/// Receiver half of a job feed.
///
/// Always holds the latest snapshot; `changed().await` wakes on each
/// publish and returns `Err` once the tracked job's poller is gone.
pub type JobUpdates = watch::Receiver<BatchJob>;

/// Publish side of the per-job snapshot channel.
///
/// Listeners that fall behind skip straight to the latest snapshot;
/// intermediate states are not replayed.
#[derive(Debug)]
pub struct JobFeed {
    sender: watch::Sender<BatchJob>,
}

impl JobFeed {
    /// Create a feed seeded with the initial job state.
    pub fn new(initial: BatchJob) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Publish a new snapshot to all subscribers.
    pub fn publish(&self, job: BatchJob) {
        // A send error only means there are zero subscribers.
        let _ = self.sender.send(job);
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> JobUpdates {
        self.sender.subscribe()
    }
}
