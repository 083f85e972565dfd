//! Autobatch CLI
//!
//! Command-line interface for running batches against the batch gateway and
//! inspecting or stopping individual jobs.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "autobatch")]
#[command(about = "Batch job orchestration CLI", long_about = None)]
struct Cli {
    /// Batch gateway URL
    #[arg(long, env = "BATCH_API_URL", default_value = "http://localhost:8080")]
    backend_url: String,

    /// Compute region
    #[arg(long, env = "REGION", default_value = "eu-west-2")]
    region: String,

    /// Timeout of a single gateway request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "30")]
    request_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autobatch_runner=info,autobatch_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config {
        backend_url: cli.backend_url,
        region: cli.region,
        request_timeout: Duration::from_secs(cli.request_timeout),
    };

    handle_command(cli.command, &config).await
}
