//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod run;

pub use run::RunArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a whole batch from a descriptors file
    Run(RunArgs),
    /// Show the status of one or more jobs
    Status {
        /// Job handles returned by the gateway
        #[arg(required = true)]
        handles: Vec<String>,
    },
    /// Terminate one or more jobs
    Terminate {
        /// Job handles returned by the gateway
        #[arg(required = true)]
        handles: Vec<String>,

        /// Reason recorded against every terminated job
        #[arg(short, long, default_value = "Terminated by operator")]
        reason: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run(args) => run::handle_run_command(args, config).await,
        Commands::Status { handles } => job::show_status(&handles, config).await,
        Commands::Terminate { handles, reason } => {
            job::terminate_jobs(&handles, &reason, config).await
        }
    }
}
