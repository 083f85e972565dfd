//! Run command handler
//!
//! Runs one batch in the foreground, the same way the runner binary does,
//! with settings taken from flags instead of the environment.

use anyhow::{Context, Result};
use autobatch_core::domain::report::{DescriptorOutcome, RunReport};
use clap::Args;
use colored::*;
use std::path::PathBuf;
use std::time::Duration;

use super::job::colorize_status;
use crate::config::Config;

/// Arguments of the `run` command
#[derive(Args)]
pub struct RunArgs {
    /// JSON array of job descriptors
    #[arg(short, long)]
    descriptors: PathBuf,

    /// Where the run report is written
    #[arg(short, long, default_value = "report.json")]
    report: PathBuf,

    /// Job definition every submission refers to
    #[arg(long, env = "JOB_DEFINITION")]
    job_definition: String,

    /// Queue jobs are submitted to
    #[arg(long, env = "JOB_QUEUE")]
    job_queue: String,

    /// Name given to every submitted job
    #[arg(long, env = "JOB_NAME", default_value = "autobatch")]
    job_name: String,

    /// CPUs requested per job
    #[arg(long, default_value = "1")]
    vcpus: u32,

    /// Memory requested per job, in MiB
    #[arg(long, default_value = "512")]
    memory: u32,

    /// Maximum duration of a single job attempt, in seconds
    #[arg(long, default_value = "21600")]
    job_timeout: u64,

    /// Budget for the whole run, in seconds
    #[arg(long, default_value = "21600")]
    run_timeout: u64,

    /// Seconds between status polls
    #[arg(long, default_value = "60")]
    poll_interval: u64,

    /// Minimum fraction of observed jobs that must succeed
    #[arg(long, default_value = "0.95")]
    success_rate: f64,

    /// Submit at most this many jobs
    #[arg(long)]
    max_runs: Option<usize>,

    /// Only consider the first two descriptors
    #[arg(long)]
    test_mode: bool,

    /// Shell command that publishes the job environment
    #[arg(long)]
    prepare_command: Option<String>,

    /// Environment variables copied into every job (comma-separated)
    #[arg(long, value_delimiter = ',')]
    passthrough_env: Vec<String>,
}

impl RunArgs {
    fn runner_config(self, config: &Config) -> autobatch_runner::config::Config {
        let mut runner = autobatch_runner::config::Config::new(
            config.backend_url.clone(),
            self.job_definition,
            self.job_queue,
        );
        runner.region = config.region.clone();
        runner.request_timeout = config.request_timeout;
        runner.job_name = self.job_name;
        runner.vcpus = self.vcpus;
        runner.memory = self.memory;
        runner.job_timeout = Duration::from_secs(self.job_timeout);
        runner.run_timeout = Duration::from_secs(self.run_timeout);
        runner.poll_interval = Duration::from_secs(self.poll_interval);
        runner.success_rate = self.success_rate;
        runner.max_runs = self.max_runs;
        runner.test_mode = self.test_mode;
        runner.prepare_command = self.prepare_command;
        runner.passthrough_env = self.passthrough_env;
        runner.descriptors_path = self.descriptors;
        runner.report_path = self.report;
        runner
    }
}

/// Handle the run command
pub async fn handle_run_command(args: RunArgs, config: &Config) -> Result<()> {
    let runner = args.runner_config(config);
    runner.validate().context("Invalid run settings")?;

    println!(
        "{}",
        format!(
            "Running batch from {} on queue {}",
            runner.descriptors_path.display(),
            runner.job_queue
        )
        .bold()
    );

    let run = runner.run()?;

    match run.execute().await {
        Ok(report) => {
            print_report(&report);
            println!(
                "\n{}",
                format!("✓ Report written to {}", runner.report_path.display()).green()
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", format!("✗ Run failed: {}", e).red());
            Err(e).context("Batch run failed")
        }
    }
}

/// Print one line per descriptor
fn print_report(report: &RunReport) {
    println!("{}", format!("Run {}:", report.run_id).bold());
    for annotated in &report.descriptors {
        let outinfo = annotated.descriptor.outinfo.as_str();
        match &annotated.outcome {
            DescriptorOutcome::Skipped => {
                println!("  {} {} {}", "▸".cyan(), outinfo, "skipped".dimmed())
            }
            DescriptorOutcome::NotRun => {
                println!("  {} {} {}", "▸".cyan(), outinfo, "not run".yellow())
            }
            DescriptorOutcome::Finished {
                handle,
                status,
                force_terminated,
            } => {
                let killed = if *force_terminated { " (terminated)" } else { "" };
                println!(
                    "  {} {} {} {}{}",
                    "▸".cyan(),
                    outinfo,
                    colorize_status(*status),
                    handle.as_str().dimmed(),
                    killed.red()
                );
            }
        }
    }

    let duration = report
        .finished_at
        .signed_duration_since(report.started_at)
        .num_seconds();
    println!("  Duration: {}s", duration);
}
