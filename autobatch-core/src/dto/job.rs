//! Job DTOs for the batch gateway

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::job::JobStatus;

/// A single `name=value` pair in a container environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub name: String,
    pub value: String,
}

/// Per-submission overrides of the job definition's container settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOverrides {
    pub environment: Vec<KeyValuePair>,
    pub vcpus: u32,
    /// MiB
    pub memory: u32,
}

/// Per-attempt execution limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTimeout {
    pub attempt_duration_seconds: u64,
}

/// Request to submit one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobRequest {
    pub job_definition: String,
    pub job_name: String,
    pub job_queue: String,
    pub timeout: JobTimeout,
    pub container_overrides: ContainerOverrides,
}

impl SubmitJobRequest {
    /// Looks up an environment variable in the overrides
    pub fn env(&self, name: &str) -> Option<&str> {
        self.container_overrides
            .environment
            .iter()
            .find(|kv| kv.name == name)
            .map(|kv| kv.value.as_str())
    }
}

/// Builds the environment list for a submission
///
/// `base` entries (credentials, artifact reference) come first, then the
/// descriptor's own variables. Later entries win on name clashes.
pub fn environment_list(
    base: &BTreeMap<String, String>,
    descriptor_env: &BTreeMap<String, String>,
) -> Vec<KeyValuePair> {
    let mut merged = base.clone();
    merged.extend(
        descriptor_env
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );
    merged
        .into_iter()
        .map(|(name, value)| KeyValuePair { name, value })
        .collect()
}

/// Gateway response to a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    pub job_id: String,
    pub job_name: String,
}

/// Gateway description of one job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescription {
    pub job_id: String,
    /// Raw backend status; may carry states the orchestrator does not track
    pub status: String,
    #[serde(default)]
    pub status_reason: Option<String>,
}

impl JobDescription {
    pub fn job_status(&self) -> JobStatus {
        JobStatus::parse(&self.status)
    }
}

/// Request to terminate one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminateJobRequest {
    pub reason: String,
}
