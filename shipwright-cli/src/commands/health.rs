//! Health command handler

use anyhow::{Context, Result};
use colored::*;
use shipwright_client::GatewayClient;

use crate::config::Config;

pub async fn handle_health(config: &Config) -> Result<()> {
    let client = GatewayClient::new(&config.gateway_url);
    let report = client
        .health()
        .await
        .with_context(|| format!("Gateway at {} is not reachable", client.base_url()))?;

    let status = if report.status == "healthy" {
        report.status.green()
    } else {
        report.status.red()
    };

    println!("{} {}", report.service.bold(), status);
    println!("  Gateway:      {}", client.base_url().dimmed());
    println!("  Active jobs:  {}", report.active_jobs);

    Ok(())
}
