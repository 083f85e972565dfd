//! Environment packaging
//!
//! Publishes the executable unit somewhere the backend can fetch it, and
//! returns a reference every job receives in its environment.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::error::ServiceError;

/// Publishes the job environment before submission
#[async_trait]
pub trait EnvironmentPackager: Send + Sync {
    /// Returns the artifact reference, if the workload uses one
    async fn package(&self) -> Result<Option<String>, ServiceError>;
}

/// Nothing to publish
pub struct NoopPackager;

#[async_trait]
impl EnvironmentPackager for NoopPackager {
    async fn package(&self) -> Result<Option<String>, ServiceError> {
        Ok(None)
    }
}

/// Runs a shell command and takes its last output line as the reference
pub struct CommandPackager {
    command: String,
}

impl CommandPackager {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl EnvironmentPackager for CommandPackager {
    async fn package(&self) -> Result<Option<String>, ServiceError> {
        info!("Preparing batch environment: {}", self.command);

        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .await
            .map_err(|e| ServiceError::Packaging(format!("failed to spawn: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            debug!(">>>\t{}", line.replace('\r', " "));
        }

        if !output.status.success() {
            return Err(ServiceError::Packaging(format!(
                "'{}' exited with {}",
                self.command, output.status
            )));
        }

        let reference = last_line(&stdout).ok_or_else(|| {
            ServiceError::Packaging(format!("'{}' produced no output", self.command))
        })?;
        info!("Batch environment published as {}", reference);
        Ok(Some(reference))
    }
}

fn last_line(output: &str) -> Option<String> {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
