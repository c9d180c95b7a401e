//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod health;
mod submit;

pub use submit::SubmitArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a task to the gateway
    Submit(SubmitArgs),
    /// Show gateway health
    Health,
}

/// Routes the command to the appropriate handler module
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Submit(args) => submit::handle_submit(args, config).await,
        Commands::Health => health::handle_health(config).await,
    }
}
