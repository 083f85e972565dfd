//! Autobatch Runner
//!
//! Runs one batch end to end from environment configuration: loads job
//! descriptors, publishes the job environment, submits every pending
//! descriptor to the batch gateway, monitors the jobs under the run deadline
//! and failure-rate breaker, then writes the run report.

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autobatch_runner::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autobatch_runner=info,autobatch_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting autobatch runner");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: backend_url={}, job_definition={}, job_queue={}",
        config.backend_url, config.job_definition, config.job_queue
    );
    info!(
        "Poll interval: {:?}, run timeout: {:?}, success rate: {}",
        config.poll_interval, config.run_timeout, config.success_rate
    );

    // The deadline is fixed here, right before the run starts
    let run = config.run()?;

    match run.execute().await {
        Ok(report) => {
            info!(
                "Run {} completed, report written to {}",
                report.run_id,
                config.report_path.display()
            );
            Ok(())
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            Err(e).context("Batch run failed")
        }
    }
}

/// Loads and validates configuration from environment variables
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    Ok(config)
}
