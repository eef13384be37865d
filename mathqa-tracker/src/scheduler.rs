//! Poll scheduler
//!
//! Owns, per job id, the single active polling task. Each task fetches
//! status on a fixed cadence, forwards payloads to the reconciler,
//! publishes the merged snapshot, and stops itself on a terminal state.
//!
//! Ticks are non-overlapping: the next tick is not scheduled until the
//! previous fetch has settled, so at most one request is in flight per
//! id regardless of network latency. Any fetch failure stops the poller
//! immediately and marks the job `error`; there is no retry and no
//! backoff.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::feed::{JobFeed, JobUpdates};
use crate::fetch::StatusFetch;
use crate::reconcile;
use mathqa_core::domain::job::{BatchJob, JobStatus};

/// Default polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// How a `waiting` status is interpreted mid-poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    /// Tracking a job this client just submitted: `waiting` means the
    /// job legitimately has not started yet, so keep polling.
    Submission,
    /// Attaching to a job by id: a `waiting` job being looked up has
    /// nothing to show, so stop immediately and report idle.
    Retrieval,
}

/// Handle to one active poller, returned from [`PollScheduler::start`].
///
/// Carries the snapshot subscription; the tracked state lives inside
/// the poll task, never in shared module state.
#[derive(Debug)]
pub struct PollHandle {
    id: String,
    updates: JobUpdates,
}

impl PollHandle {
    /// The tracked job id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Subscribe to merged snapshots.
    pub fn updates(&self) -> JobUpdates {
        self.updates.clone()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> BatchJob {
        self.updates.borrow().clone()
    }
}

struct ActivePoll {
    generation: u64,
    task: JoinHandle<()>,
}

/// Per-id polling state machine: `Idle -> Polling -> Stopped`.
///
/// `start` on an id that is already `Polling` is a no-op; `stop` is
/// idempotent from every state.
pub struct PollScheduler {
    interval: Duration,
    active: Arc<Mutex<HashMap<String, ActivePoll>>>,
    generations: AtomicU64,
}

impl PollScheduler {
    /// Create a scheduler with the given polling cadence.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            active: Arc::new(Mutex::new(HashMap::new())),
            generations: AtomicU64::new(0),
        }
    }

    /// Begin polling a job id.
    ///
    /// Returns `None` without side effects if a poller for this id is
    /// already running; at most one active timer exists per id at any
    /// instant.
    ///
    /// # Arguments
    /// * `id` - The tracked job id
    /// * `mode` - Governs the interpretation of a `waiting` status
    /// * `fetcher` - Issues the per-tick status fetches
    /// * `initial` - Job state as of handle acquisition
    pub fn start(
        &self,
        id: impl Into<String>,
        mode: TrackingMode,
        fetcher: Arc<dyn StatusFetch>,
        initial: BatchJob,
    ) -> Option<PollHandle> {
        let id = id.into();
        let mut active = self.active.lock().expect("poll registry poisoned");

        if active.contains_key(&id) {
            debug!(job = %id, "already polling; start ignored");
            return None;
        }

        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let feed = JobFeed::new(initial.clone());
        let updates = feed.subscribe();

        info!(job = %id, ?mode, interval = ?self.interval, "poll started");

        let task = tokio::spawn(poll_loop(
            id.clone(),
            generation,
            mode,
            fetcher,
            self.interval,
            initial,
            feed,
            Arc::clone(&self.active),
        ));
        active.insert(id.clone(), ActivePoll { generation, task });

        Some(PollHandle { id, updates })
    }

    /// Stop polling a job id.
    ///
    /// Idempotent: unknown, never-started, and already-stopped ids are
    /// all no-ops. On return no future tick will fire and any in-flight
    /// fetch is cancelled.
    pub fn stop(&self, id: &str) {
        let mut active = self.active.lock().expect("poll registry poisoned");
        if let Some(poll) = active.remove(id) {
            poll.task.abort();
            info!(job = %id, "poll stopped");
        }
    }

    /// Whether a poller is currently active for this id.
    pub fn is_polling(&self, id: &str) -> bool {
        self.active
            .lock()
            .expect("poll registry poisoned")
            .contains_key(id)
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

/// One poller's lifetime: tick, fetch, merge, publish, repeat until a
/// stop condition, then deregister.
#[allow(clippy::too_many_arguments)]
async fn poll_loop(
    id: String,
    generation: u64,
    mode: TrackingMode,
    fetcher: Arc<dyn StatusFetch>,
    interval: Duration,
    mut job: BatchJob,
    feed: JobFeed,
    registry: Arc<Mutex<HashMap<String, ActivePoll>>>,
) {
    let mut ticker = time::interval(interval);
    // Delay, not burst: a fetch slower than the cadence must push the
    // next tick out, keeping at most one request in flight.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval's first tick completes immediately; consume it so the
    // first fetch lands one full period after start.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        debug!(job = %id, "fetching status");

        match fetcher.fetch_status(&id).await {
            Ok(update) => {
                job = reconcile::merge(&job, &update);
                feed.publish(job.clone());

                if job.status.is_terminal() {
                    info!(job = %id, status = ?job.status, "job reached terminal state");
                    break;
                }
                if mode == TrackingMode::Retrieval && job.status == JobStatus::Waiting {
                    info!(job = %id, "job has not started; nothing to track");
                    break;
                }
            }
            Err(err) => {
                warn!(job = %id, error = %err, "status fetch failed; stopping poll");
                if !job.status.is_terminal() {
                    job.status = JobStatus::Error;
                    job.message = Some(err.to_string());
                    job.touch();
                }
                feed.publish(job.clone());
                break;
            }
        }
    }

    let mut active = registry.lock().expect("poll registry poisoned");
    // Only remove our own entry; a newer poller for the same id owns a
    // later generation.
    if active.get(&id).is_some_and(|poll| poll.generation == generation) {
        active.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use crate::error::TrackError;
    use mathqa_core::domain::job::EvaluationResult;
    use mathqa_core::dto::batch::StatusUpdate;

    /// Fetcher that replays a fixed script of responses and counts
    /// every call. Exhausting the script is a test bug, reported as a
    /// fetch failure.
    struct ScriptedFetch {
        steps: Mutex<VecDeque<Result<StatusUpdate, TrackError>>>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedFetch {
        fn new(steps: Vec<Result<StatusUpdate, TrackError>>) -> Arc<Self> {
            Self::with_delay(steps, Duration::ZERO)
        }

        fn with_delay(steps: Vec<Result<StatusUpdate, TrackError>>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusFetch for ScriptedFetch {
        async fn fetch_status(&self, id: &str) -> Result<StatusUpdate, TrackError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            if !self.delay.is_zero() {
                time::sleep(self.delay).await;
            }

            let step = self.steps.lock().unwrap().pop_front();
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            step.unwrap_or_else(|| {
                Err(TrackError::PollFetch {
                    id: id.to_string(),
                    reason: "script exhausted".to_string(),
                })
            })
        }
    }

    fn progress(current: u64, total: u64) -> Result<StatusUpdate, TrackError> {
        let mut update = StatusUpdate::status_only(JobStatus::InProgress);
        update.current = Some(current);
        update.total = Some(total);
        Ok(update)
    }

    fn completed(rows: usize) -> Result<StatusUpdate, TrackError> {
        let mut update = StatusUpdate::status_only(JobStatus::Completed);
        update.results = Some(
            (0..rows)
                .map(|i| EvaluationResult {
                    id: format!("row-{}", i),
                    problem: format!("problem {}", i),
                    true_answer: "1".to_string(),
                    predicted_answer: "1".to_string(),
                    predictions: Vec::new(),
                    progress: None,
                })
                .collect(),
        );
        Ok(update)
    }

    /// Drain the feed until the poller deregisters and drops its
    /// sender, then return the final snapshot.
    async fn final_snapshot(mut updates: JobUpdates) -> BatchJob {
        while updates.changed().await.is_ok() {}
        updates.borrow().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_tracking_runs_to_completion() {
        let scheduler = PollScheduler::default();
        let fetch = ScriptedFetch::new(vec![progress(2, 5), completed(5)]);

        let handle = scheduler
            .start(
                "batch-a",
                TrackingMode::Submission,
                fetch.clone(),
                BatchJob::new("batch-a", JobStatus::Started),
            )
            .expect("fresh id must start");

        let job = final_snapshot(handle.updates()).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.results.len(), 5);
        assert!(!scheduler.is_polling("batch-a"));
        assert_eq!(fetch.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_tracking_keeps_polling_through_waiting() {
        let scheduler = PollScheduler::default();
        let fetch = ScriptedFetch::new(vec![
            Ok(StatusUpdate::status_only(JobStatus::Waiting)),
            Ok(StatusUpdate::status_only(JobStatus::Waiting)),
            progress(1, 3),
            completed(3),
        ]);

        let handle = scheduler
            .start(
                "batch-w",
                TrackingMode::Submission,
                fetch.clone(),
                BatchJob::new("batch-w", JobStatus::Waiting),
            )
            .unwrap();

        let job = final_snapshot(handle.updates()).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(fetch.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrieval_stops_on_first_waiting() {
        let scheduler = PollScheduler::default();
        let fetch = ScriptedFetch::new(vec![Ok(StatusUpdate::status_only(JobStatus::Waiting))]);

        let handle = scheduler
            .start(
                "batch-b",
                TrackingMode::Retrieval,
                fetch.clone(),
                BatchJob::new("batch-b", JobStatus::Waiting),
            )
            .unwrap();

        let job = final_snapshot(handle.updates()).await;
        assert_eq!(job.status, JobStatus::Waiting);
        assert!(!scheduler.is_polling("batch-b"));
        assert_eq!(fetch.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrieval_tracks_running_job_to_completion() {
        let scheduler = PollScheduler::default();
        let fetch = ScriptedFetch::new(vec![progress(1, 2), completed(2)]);

        let handle = scheduler
            .start(
                "batch-r",
                TrackingMode::Retrieval,
                fetch.clone(),
                BatchJob::new("batch-r", JobStatus::Waiting),
            )
            .unwrap();

        let job = final_snapshot(handle.updates()).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.results.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_fails_closed() {
        let scheduler = PollScheduler::default();
        let fetch = ScriptedFetch::new(vec![
            progress(1, 5),
            progress(2, 5),
            Err(TrackError::PollFetch {
                id: "batch-c".to_string(),
                reason: "connection reset".to_string(),
            }),
        ]);

        let handle = scheduler
            .start(
                "batch-c",
                TrackingMode::Submission,
                fetch.clone(),
                BatchJob::new("batch-c", JobStatus::Started),
            )
            .unwrap();

        let job = final_snapshot(handle.updates()).await;
        assert_eq!(job.status, JobStatus::Error);
        assert!(!scheduler.is_polling("batch-c"));
        assert_eq!(fetch.calls(), 3);

        // no retry ever happens: well past several cadences, still 3
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fetch.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_start_is_a_no_op() {
        let scheduler = PollScheduler::default();
        let fetch = ScriptedFetch::new(vec![progress(1, 5), completed(5)]);

        let handle = scheduler
            .start(
                "batch-d",
                TrackingMode::Submission,
                fetch.clone(),
                BatchJob::new("batch-d", JobStatus::Started),
            )
            .unwrap();

        let second = scheduler.start(
            "batch-d",
            TrackingMode::Submission,
            fetch.clone(),
            BatchJob::new("batch-d", JobStatus::Started),
        );
        assert!(second.is_none());

        let job = final_snapshot(handle.updates()).await;
        assert_eq!(job.status, JobStatus::Completed);
        // only the first poller ever fetched
        assert_eq!(fetch.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_final() {
        let scheduler = PollScheduler::default();
        let fetch = ScriptedFetch::new(vec![progress(1, 5), progress(2, 5), progress(3, 5)]);

        let handle = scheduler
            .start(
                "batch-e",
                TrackingMode::Submission,
                fetch.clone(),
                BatchJob::new("batch-e", JobStatus::Started),
            )
            .unwrap();
        let mut updates = handle.updates();

        // let one fetch land, then cancel
        updates.changed().await.unwrap();
        let calls_at_stop = fetch.calls();
        scheduler.stop("batch-e");
        scheduler.stop("batch-e");
        scheduler.stop("never-started");
        assert!(!scheduler.is_polling("batch-e"));

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fetch.calls(), calls_at_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_id_can_be_tracked_again_after_stop() {
        let scheduler = PollScheduler::default();

        let first = ScriptedFetch::new(vec![progress(1, 5)]);
        scheduler
            .start(
                "batch-f",
                TrackingMode::Submission,
                first,
                BatchJob::new("batch-f", JobStatus::Started),
            )
            .unwrap();
        scheduler.stop("batch-f");

        let second = ScriptedFetch::new(vec![completed(1)]);
        let handle = scheduler
            .start(
                "batch-f",
                TrackingMode::Submission,
                second,
                BatchJob::new("batch-f", JobStatus::Started),
            )
            .expect("stopped id must be startable again");

        let job = final_snapshot(handle.updates()).await;
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_never_overlap_under_slow_fetches() {
        let scheduler = PollScheduler::new(Duration::from_millis(100));
        // each fetch takes several cadences to settle
        let fetch = ScriptedFetch::with_delay(
            vec![progress(1, 3), progress(2, 3), completed(3)],
            Duration::from_millis(350),
        );

        let handle = scheduler
            .start(
                "batch-g",
                TrackingMode::Submission,
                fetch.clone(),
                BatchJob::new("batch-g", JobStatus::Started),
            )
            .unwrap();

        let job = final_snapshot(handle.updates()).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(fetch.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(fetch.calls(), 3);
    }
}
