//! Batch command handlers
//!
//! Submission with live tracking, reattaching to a running job by id,
//! and CSV export of the final results.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;

use crate::config::Config;
use mathqa_client::BackendClient;
use mathqa_core::domain::job::{BatchJob, EvaluationResult, JobStatus};
use mathqa_tracker::fetch::{ProgressFetch, RetrieveFetch};
use mathqa_tracker::project::ResultProjector;
use mathqa_tracker::submit::{JobSubmitter, SubmitConfig};
use mathqa_tracker::{PollHandle, PollScheduler, TrackingMode};

/// Batch subcommands
#[derive(Subcommand)]
pub enum BatchCommands {
    /// Submit a problems CSV and track it to completion
    Run {
        /// Path to the CSV file (needs `problem` and `answer` columns)
        file: PathBuf,

        /// Model name to evaluate with
        #[arg(long)]
        model: Option<String>,

        /// System prompt sent along with every problem
        #[arg(long)]
        system_prompt: Option<String>,

        /// Predictions per problem (also the export column count)
        #[arg(long, default_value_t = 8)]
        max_num_seqs: u32,

        /// Token budget per prediction
        #[arg(long, default_value_t = 14000)]
        max_length: u32,

        /// Poll cadence in milliseconds
        #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval_ms: u64,

        /// Write the results as CSV to this path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Attach to a job already in progress
    Attach {
        /// Server-assigned job id
        id: String,

        /// Prediction column count for display and export
        #[arg(long, default_value_t = 8)]
        max_num_seqs: u32,

        /// Poll cadence in milliseconds
        #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval_ms: u64,

        /// Write the results as CSV to this path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Handle batch commands
pub async fn handle_batch_command(command: BatchCommands, config: &Config) -> Result<()> {
    match command {
        BatchCommands::Run {
            file,
            model,
            system_prompt,
            max_num_seqs,
            max_length,
            poll_interval_ms,
            out,
        } => {
            let submit_config = build_submit_config(model, system_prompt, max_num_seqs, max_length);
            run_batch(config, &file, submit_config, poll_interval_ms, out.as_deref()).await
        }
        BatchCommands::Attach {
            id,
            max_num_seqs,
            poll_interval_ms,
            out,
        } => attach_batch(config, &id, max_num_seqs, poll_interval_ms, out.as_deref()).await,
    }
}

fn build_submit_config(
    model: Option<String>,
    system_prompt: Option<String>,
    max_num_seqs: u32,
    max_length: u32,
) -> SubmitConfig {
    let defaults = SubmitConfig::default();
    SubmitConfig {
        model_name: model.unwrap_or(defaults.model_name),
        system_prompt: system_prompt.unwrap_or(defaults.system_prompt),
        max_num_seqs,
        max_length,
    }
}

/// Submit a CSV and track the job until it finishes
async fn run_batch(
    config: &Config,
    file: &Path,
    submit_config: SubmitConfig,
    poll_interval_ms: u64,
    out: Option<&Path>,
) -> Result<()> {
    let client = Arc::new(BackendClient::new(&config.backend_url));
    let projector = ResultProjector::new(submit_config.max_num_seqs as usize);
    let submitter = JobSubmitter::new(Arc::clone(&client));

    let handle = match submitter.submit(file, &submit_config).await {
        Ok(handle) => handle,
        Err(e) => {
            // The flow still surfaces one synthetic failed row so the
            // output shape matches a tracked failure.
            println!("{} {}", "✗".red(), e.to_string().red());
            let job = BatchJob::submit_failure(e.to_string());
            print_results(&projector, &job.results);
            export_results(&projector, &job.results, out)?;
            anyhow::bail!("batch submission failed");
        }
    };

    println!(
        "{} Submitted batch {} ({})",
        "✓".green(),
        handle.id.cyan(),
        handle.status.to_string().dimmed()
    );

    let scheduler = PollScheduler::new(Duration::from_millis(poll_interval_ms));
    let poll = scheduler
        .start(
            handle.id.clone(),
            TrackingMode::Submission,
            Arc::new(ProgressFetch::new(client)),
            handle.initial_job(),
        )
        .context("job is already being tracked")?;

    let job = watch_job(poll).await;
    report_final(&projector, &job, out)
}

/// Attach to an existing job by id and track it
async fn attach_batch(
    config: &Config,
    id: &str,
    max_num_seqs: u32,
    poll_interval_ms: u64,
    out: Option<&Path>,
) -> Result<()> {
    let client = Arc::new(BackendClient::new(&config.backend_url));
    let projector = ResultProjector::new(max_num_seqs as usize);

    println!("{} Attaching to batch {}", "▸".cyan(), id.cyan());

    let scheduler = PollScheduler::new(Duration::from_millis(poll_interval_ms));
    let poll = scheduler
        .start(
            id.to_string(),
            TrackingMode::Retrieval,
            Arc::new(RetrieveFetch::new(client)),
            BatchJob::new(id, JobStatus::Waiting),
        )
        .context("job is already being tracked")?;

    let job = watch_job(poll).await;

    if job.status == JobStatus::Waiting {
        println!("{}", "Job has not started; nothing to show.".yellow());
        return Ok(());
    }

    report_final(&projector, &job, out)
}

/// Print progress messages as snapshots arrive, then return the final
/// tracked state once the poller stops.
async fn watch_job(poll: PollHandle) -> BatchJob {
    let mut updates = poll.updates();
    let mut last_message: Option<String> = None;

    while updates.changed().await.is_ok() {
        let job = updates.borrow_and_update().clone();
        if job.message.is_some() && job.message != last_message {
            if let Some(message) = &job.message {
                println!("  {}", message.dimmed());
            }
            last_message = job.message.clone();
        }
    }

    poll.snapshot()
}

/// Print the terminal outcome, render results, export if requested
fn report_final(projector: &ResultProjector, job: &BatchJob, out: Option<&Path>) -> Result<()> {
    match job.status {
        JobStatus::Completed => {
            println!("{} Batch {} completed", "✓".green(), job.id.cyan());
        }
        JobStatus::Error => {
            println!(
                "{} Batch {} failed: {}",
                "✗".red(),
                job.id.cyan(),
                job.message.as_deref().unwrap_or("unknown error").red()
            );
        }
        _ => {
            println!(
                "{} Batch {} stopped while {}",
                "▸".yellow(),
                job.id.cyan(),
                job.status
            );
        }
    }

    print_results(projector, &job.results);
    export_results(projector, &job.results, out)?;

    if job.status == JobStatus::Error {
        anyhow::bail!("batch did not complete");
    }
    Ok(())
}

/// Print results as a fixed-width table
fn print_results(projector: &ResultProjector, results: &[EvaluationResult]) {
    if results.is_empty() {
        println!("{}", "No results.".yellow());
        return;
    }

    println!();
    println!("{}", format!("Results ({} row(s)):", results.len()).bold());
    println!("  {}", projector.header().join(" | ").bold());
    for row in projector.rows(results) {
        let cells: Vec<String> = row.iter().map(|cell| clip(cell, 48)).collect();
        println!("  {}", cells.join(" | "));
    }
}

/// Export results as CSV when an output path was given
fn export_results(
    projector: &ResultProjector,
    results: &[EvaluationResult],
    out: Option<&Path>,
) -> Result<()> {
    let Some(path) = out else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    projector
        .write_csv(results, file)
        .context("failed to write CSV export")?;

    println!("{} Results written to {}", "✓".green(), path.display());
    Ok(())
}

/// Shorten a cell for terminal display
fn clip(cell: &str, width: usize) -> String {
    if cell.chars().count() <= width {
        cell.to_string()
    } else {
        let clipped: String = cell.chars().take(width).collect();
        format!("{}...", clipped)
    }
}
