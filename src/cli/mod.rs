//! One-shot terminal commands. Each opens the shared store directly and
//! applies the same bounds and lifecycle rules as the daemon's tools.

pub mod facts;
pub mod mailbox;
pub mod status;

use anyhow::{Context, Result};

/// Sender id recorded for messages sent from the terminal.
pub const CLI_SENDER: &str = "cli";

fn current_dir() -> Result<String> {
    let dir = std::env::current_dir().context("failed to determine working directory")?;
    Ok(dir.to_string_lossy().into_owned())
}
