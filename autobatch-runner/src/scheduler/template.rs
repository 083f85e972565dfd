//! Job template
//!
//! Everything a submission needs besides the descriptor itself: job
//! definition, queue, resources, attempt timeout and the environment shared
//! by every job of the run.

use autobatch_core::domain::descriptor::JobDescriptor;
use autobatch_core::dto::job::{
    ContainerOverrides, JobTimeout, SubmitJobRequest, environment_list,
};
use std::collections::BTreeMap;
use std::time::Duration;

/// Environment variable carrying the packaged environment's reference
pub const ARTIFACT_ENV: &str = "BATCHPAR_S3FILE_TIMESTAMP";

#[derive(Debug, Clone, PartialEq)]
pub struct JobTemplate {
    pub job_definition: String,
    pub job_name: String,
    pub job_queue: String,
    pub vcpus: u32,
    /// MiB
    pub memory: u32,
    pub attempt_timeout: Duration,
    /// Variables added to every job, unprefixed
    pub shared_env: BTreeMap<String, String>,
}

impl JobTemplate {
    pub fn new(
        job_definition: impl Into<String>,
        job_name: impl Into<String>,
        job_queue: impl Into<String>,
    ) -> Self {
        Self {
            job_definition: job_definition.into(),
            job_name: job_name.into(),
            job_queue: job_queue.into(),
            vcpus: 1,
            memory: 512,
            attempt_timeout: Duration::from_secs(21_600),
            shared_env: BTreeMap::new(),
        }
    }

    pub fn with_resources(mut self, vcpus: u32, memory: u32) -> Self {
        self.vcpus = vcpus;
        self.memory = memory;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.shared_env.insert(name.into(), value.into());
        self
    }

    /// Builds the submission for one descriptor
    pub fn request_for(&self, descriptor: &JobDescriptor) -> SubmitJobRequest {
        SubmitJobRequest {
            job_definition: self.job_definition.clone(),
            job_name: self.job_name.clone(),
            job_queue: self.job_queue.clone(),
            timeout: JobTimeout {
                attempt_duration_seconds: self.attempt_timeout.as_secs(),
            },
            container_overrides: ContainerOverrides {
                environment: environment_list(&self.shared_env, &descriptor.environment()),
                vcpus: self.vcpus,
                memory: self.memory,
            },
        }
    }
}
