//! Shipwright CLI
//!
//! Command-line interface for submitting tasks to a Shipwright gateway.

mod attachment;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "shipwright")]
#[command(about = "Submit app-generation tasks to a Shipwright gateway", long_about = None)]
struct Cli {
    /// Gateway URL
    #[arg(
        long,
        env = "SHIPWRIGHT_GATEWAY_URL",
        default_value = "http://localhost:3000"
    )]
    gateway_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        gateway_url: cli.gateway_url,
    };

    handle_command(cli.command, &config).await
}
