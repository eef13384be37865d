//! MathQA CLI
//!
//! Command-line client for the batch evaluation backend: submit a
//! problems CSV and watch it run, reattach to a job by id, or chat
//! with the model directly.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mathqa")]
#[command(about = "Math QA batch evaluation client", long_about = None)]
struct Cli {
    /// Backend URL
    #[arg(
        long,
        env = "MATHQA_BACKEND_URL",
        default_value = "http://localhost:8000"
    )]
    backend_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config {
        backend_url: cli.backend_url,
    };

    handle_command(cli.command, &config).await
}
