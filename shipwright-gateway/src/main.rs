//! Shipwright Gateway
//!
//! HTTP front door of the pipeline. Accepts task submissions, checks the
//! shared secret, and hands each job to the dispatcher, which runs it in the
//! background and reports the result to the submission's evaluation URL.

mod api;
mod config;

use anyhow::{Context, Result};
use shipwright_runner::{JobDispatcher, JobOrchestrator};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::AppState;
use crate::config::GatewayConfig;

const DEFAULT_LOG_FILTER: &str = "shipwright_gateway=info,shipwright_runner=info,tower_http=debug";

/// Extra time running jobs get to notify after the server stops accepting
const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting Shipwright Gateway");

    let config = GatewayConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!("Loaded configuration: {:?}", config);

    let orchestrator =
        JobOrchestrator::from_config(&config.runner).context("Failed to build upstream clients")?;
    let dispatcher = Arc::new(JobDispatcher::new(
        Arc::new(orchestrator),
        config.runner.max_concurrent_jobs,
    ));

    let app = api::create_router(AppState::new(
        Arc::clone(&dispatcher),
        config.shared_secret.clone(),
    ));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let running = dispatcher.active_jobs();
    if running > 0 {
        info!("Waiting for {} running job(s) to finish", running);
        let limit = config.runner.job_timeout + SHUTDOWN_GRACE;
        if tokio::time::timeout(limit, dispatcher.wait_idle()).await.is_err() {
            warn!("Jobs still running after {:?}, exiting anyway", limit);
        }
    }

    info!("Gateway stopped");
    Ok(())
}

/// Initializes logging; `SHIPWRIGHT_LOG_FORMAT=json` selects JSON lines
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("SHIPWRIGHT_LOG_FORMAT")
        .is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            error!("Failed to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    }
}
