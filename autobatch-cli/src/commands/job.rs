//! Job command handlers
//!
//! One-off status queries and terminations against the gateway.

use anyhow::{Context, Result};
use autobatch_client::BackendClient;
use autobatch_core::domain::job::{JobHandle, JobStatus};
use colored::*;

use crate::config::Config;

/// Show the status of each job
///
/// A failed query is printed and the remaining handles are still queried.
pub async fn show_status(handles: &[String], config: &Config) -> Result<()> {
    let client = config.client()?;
    let mut failures = 0;

    for handle in handles.iter().map(|h| JobHandle::new(h.as_str())) {
        match client.get_status(&handle).await {
            Ok(status) => {
                println!("  {} {} {}", "▸".cyan(), handle.as_str().bold(), colorize_status(status))
            }
            Err(e) if e.is_not_found() => {
                failures += 1;
                println!("  {} {} {}", "▸".cyan(), handle.as_str().bold(), "not found".red());
            }
            Err(e) => {
                failures += 1;
                println!("  {} {} {}", "▸".cyan(), handle.as_str().bold(), e.to_string().red());
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} status queries failed", failures, handles.len());
    }
    Ok(())
}

/// Terminate the given jobs with a reason
pub async fn terminate_jobs(handles: &[String], reason: &str, config: &Config) -> Result<()> {
    let client = config.client()?;
    let handles: Vec<JobHandle> = handles.iter().map(|h| JobHandle::new(h.as_str())).collect();

    client
        .terminate(&handles, reason)
        .await
        .context("Failed to terminate jobs")?;

    println!(
        "{}",
        format!("✓ Termination requested for {} job(s)", handles.len()).green()
    );
    println!("  Reason: {}", reason.dimmed());
    Ok(())
}

/// Colorize job status for display
pub fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        JobStatus::Submitted => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Succeeded => status_str.green(),
        JobStatus::Failed => status_str.red(),
        JobStatus::Unknown => status_str.dimmed(),
    }
}
