//! Status-snapshot reconciliation
//!
//! [`merge`] folds one canonical status payload into the tracked
//! [`BatchJob`], producing the next snapshot. The rules:
//!
//! - a terminal job is never mutated; the payload is ignored
//! - `status` advances only along permitted edges; a payload reporting
//!   an earlier status leaves it in place (other fields still apply)
//! - `results` are replaced wholesale when the payload carries a list,
//!   even a smaller one; a payload without a list leaves them untouched
//! - the tracked `id` survives every merge (payloads never carry one)
//! - `current` is clamped to `total` when both are present
//! - a missing `message` is synthesized from the progress counters;
//!   with no counters either, the previous message is retained

use mathqa_core::domain::job::BatchJob;
use mathqa_core::dto::batch::StatusUpdate;

/// Merge a status payload into the tracked job, returning the next
/// snapshot. Pure: neither input is mutated.
pub fn merge(existing: &BatchJob, update: &StatusUpdate) -> BatchJob {
    if existing.status.is_terminal() {
        return existing.clone();
    }

    let mut job = existing.clone();

    if job.status.can_advance_to(update.status) {
        job.status = update.status;
    }

    if update.total.is_some() {
        job.total = update.total;
    }
    if update.current.is_some() {
        job.current = update.current;
    }
    if let (Some(current), Some(total)) = (job.current, job.total)
        && current > total
    {
        job.current = Some(total);
    }
    if update.correct_so_far.is_some() {
        job.correct_so_far = update.correct_so_far;
    }

    if let Some(results) = &update.results {
        job.results = results.clone();
    }

    if let Some(message) = &update.message {
        job.message = Some(message.clone());
    } else if let Some(synthesized) =
        synthesize_message(job.current, job.total, job.correct_so_far)
    {
        job.message = Some(synthesized);
    }

    job.touch();
    job
}

/// Build a progress message from whichever counters are present.
///
/// Returns `None` when there is nothing to report, in which case the
/// previous message is retained.
fn synthesize_message(
    current: Option<u64>,
    total: Option<u64>,
    correct_so_far: Option<u64>,
) -> Option<String> {
    let base = match (current, total) {
        (Some(current), Some(total)) => format!("Processing {}/{}", current, total),
        (Some(current), None) => format!("Processing problem {}", current),
        (None, Some(total)) => format!("{} problems queued", total),
        (None, None) => return None,
    };

    match correct_so_far {
        Some(correct) => Some(format!("{} ({} correct so far)", base, correct)),
        None => Some(base),
    }
}
