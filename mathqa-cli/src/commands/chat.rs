//! Chat command handler
//!
//! Streams the model's reply chunk by chunk as it arrives.

use std::io::Write;

use anyhow::{Context, Result};

use crate::config::Config;
use mathqa_client::BackendClient;

/// Handle the chat command
pub async fn handle_chat_command(message: &str, config: &Config) -> Result<()> {
    let client = BackendClient::new(&config.backend_url);

    let mut stdout = std::io::stdout();
    client
        .chat_stream(message, |delta| {
            print!("{}", delta);
            let _ = stdout.flush();
        })
        .await
        .context("chat request failed")?;
    println!();

    Ok(())
}
