//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod batch;
mod chat;

pub use batch::BatchCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Batch evaluation jobs
    Batch {
        #[command(subcommand)]
        command: BatchCommands,
    },
    /// Ask the model one question, streaming the reply
    Chat {
        /// The question to ask
        message: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Batch { command } => batch::handle_batch_command(command, config).await,
        Commands::Chat { message } => chat::handle_chat_command(&message, config).await,
    }
}
