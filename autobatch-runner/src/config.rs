//! Runner configuration
//!
//! Defines all configurable parameters for a batch run: backend connection,
//! job definition and resources, run deadline, polling cadence and the
//! failure tolerance of the breaker.

use anyhow::Context;
use autobatch_client::BatchClient;
use autobatch_core::domain::policy::RunPolicy;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::run::OrchestrationRun;
use crate::scheduler::JobTemplate;
use crate::service::{
    CommandPackager, EnvironmentPackager, JsonFileDescriptorSource, JsonReportSink, NoopPackager,
};

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Batch gateway base URL (e.g., "http://localhost:8080")
    pub backend_url: String,

    /// Compute region the jobs run in
    pub region: String,

    /// Job definition every submission refers to
    pub job_definition: String,

    /// Name given to every submitted job
    pub job_name: String,

    /// Queue jobs are submitted to
    pub job_queue: String,

    /// CPUs requested per job
    pub vcpus: u32,

    /// Memory requested per job, in MiB
    pub memory: u32,

    /// Maximum duration of a single job attempt
    pub job_timeout: Duration,

    /// Budget for the whole run; the deadline is fixed from it at run start
    pub run_timeout: Duration,

    /// How often to query job statuses
    pub poll_interval: Duration,

    /// Minimum fraction of observed jobs that must succeed
    pub success_rate: f64,

    /// Cap on submitted jobs, for partial runs
    pub max_runs: Option<usize>,

    /// Consider only the first two descriptors
    pub test_mode: bool,

    /// Shell command publishing the job environment
    pub prepare_command: Option<String>,

    /// Orchestrator environment variables copied into every job
    pub passthrough_env: Vec<String>,

    /// JSON array of job descriptors
    pub descriptors_path: PathBuf,

    /// Where the run report is written
    pub report_path: PathBuf,

    /// Timeout of a single gateway request
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(backend_url: String, job_definition: String, job_queue: String) -> Self {
        Self {
            backend_url,
            region: "eu-west-2".to_string(),
            job_definition,
            job_name: "autobatch".to_string(),
            job_queue,
            vcpus: 1,
            memory: 512,
            job_timeout: Duration::from_secs(21_600), // 6 hours
            run_timeout: Duration::from_secs(21_600),
            poll_interval: Duration::from_secs(60),
            success_rate: 0.95,
            max_runs: None,
            test_mode: false,
            prepare_command: None,
            passthrough_env: Vec::new(),
            descriptors_path: PathBuf::from("descriptors.json"),
            report_path: PathBuf::from("report.json"),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - BATCH_API_URL (required)
    /// - JOB_DEFINITION (required)
    /// - JOB_QUEUE (required)
    /// - JOB_NAME (optional, default: autobatch)
    /// - REGION (optional, default: eu-west-2)
    /// - VCPUS (optional, default: 1)
    /// - MEMORY (optional, MiB, default: 512)
    /// - JOB_TIMEOUT (optional, seconds, default: 21600)
    /// - RUN_TIMEOUT (optional, seconds, default: 21600)
    /// - POLL_INTERVAL (optional, seconds, default: 60)
    /// - SUCCESS_RATE (optional, default: 0.95)
    /// - MAX_RUNS (optional)
    /// - TEST_MODE (optional, default: false)
    /// - PREPARE_COMMAND (optional)
    /// - PASSTHROUGH_ENV (optional, comma-separated names)
    /// - DESCRIPTORS_PATH (optional, default: descriptors.json)
    /// - REPORT_PATH (optional, default: report.json)
    /// - REQUEST_TIMEOUT (optional, seconds, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        let backend_url = std::env::var("BATCH_API_URL")
            .map_err(|_| anyhow::anyhow!("BATCH_API_URL environment variable not set"))?;

        let job_definition = std::env::var("JOB_DEFINITION")
            .map_err(|_| anyhow::anyhow!("JOB_DEFINITION environment variable not set"))?;

        let job_queue = std::env::var("JOB_QUEUE")
            .map_err(|_| anyhow::anyhow!("JOB_QUEUE environment variable not set"))?;

        let mut config = Self::new(backend_url, job_definition, job_queue);

        if let Ok(job_name) = std::env::var("JOB_NAME") {
            config.job_name = job_name;
        }
        if let Ok(region) = std::env::var("REGION") {
            config.region = region;
        }
        if let Some(vcpus) = parse_var("VCPUS")? {
            config.vcpus = vcpus;
        }
        if let Some(memory) = parse_var("MEMORY")? {
            config.memory = memory;
        }
        if let Some(secs) = parse_var::<u64>("JOB_TIMEOUT")? {
            config.job_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>("RUN_TIMEOUT")? {
            config.run_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>("POLL_INTERVAL")? {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(rate) = parse_var("SUCCESS_RATE")? {
            config.success_rate = rate;
        }
        config.max_runs = parse_var("MAX_RUNS")?;
        if let Some(test_mode) = parse_var("TEST_MODE")? {
            config.test_mode = test_mode;
        }
        config.prepare_command = std::env::var("PREPARE_COMMAND")
            .ok()
            .filter(|command| !command.trim().is_empty());
        if let Ok(names) = std::env::var("PASSTHROUGH_ENV") {
            config.passthrough_env = split_names(&names);
        }
        if let Ok(path) = std::env::var("DESCRIPTORS_PATH") {
            config.descriptors_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("REPORT_PATH") {
            config.report_path = PathBuf::from(path);
        }
        if let Some(secs) = parse_var::<u64>("REQUEST_TIMEOUT")? {
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend_url.is_empty() {
            anyhow::bail!("backend_url cannot be empty");
        }

        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            anyhow::bail!("backend_url must start with http:// or https://");
        }

        if self.job_definition.trim().is_empty() {
            anyhow::bail!("job_definition cannot be empty");
        }

        if self.job_queue.trim().is_empty() {
            anyhow::bail!("job_queue cannot be empty");
        }

        if self.job_name.trim().is_empty() {
            anyhow::bail!("job_name cannot be empty");
        }

        if self.vcpus == 0 {
            anyhow::bail!("vcpus must be greater than 0");
        }

        if self.memory == 0 {
            anyhow::bail!("memory must be greater than 0");
        }

        if self.poll_interval.as_secs() == 0 {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if !(0.0..=1.0).contains(&self.success_rate) {
            anyhow::bail!("success_rate must be between 0 and 1");
        }

        if self.max_runs == Some(0) {
            anyhow::bail!("max_runs must be greater than 0 when set");
        }

        Ok(())
    }

    /// Builds the run policy; the deadline starts counting now
    pub fn policy(&self) -> RunPolicy {
        RunPolicy::new(self.run_timeout, self.poll_interval, self.success_rate)
            .with_max_runs(self.max_runs)
    }

    /// Builds the submission template, resolving passthrough variables
    pub fn template(&self) -> JobTemplate {
        let mut template = JobTemplate::new(&self.job_definition, &self.job_name, &self.job_queue)
            .with_resources(self.vcpus, self.memory)
            .with_attempt_timeout(self.job_timeout);

        for (name, value) in self.passthrough_values() {
            template = template.with_env(name, value);
        }
        template
    }

    /// Builds the gateway client with the configured request timeout
    pub fn client(&self) -> anyhow::Result<BatchClient> {
        let http_client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(BatchClient::with_client(
            self.backend_url.clone(),
            self.region.clone(),
            http_client,
        ))
    }

    /// Composes a run from the JSON descriptor file, report path and
    /// optional prepare command; the deadline starts counting now
    pub fn run(&self) -> anyhow::Result<OrchestrationRun> {
        let packager: Arc<dyn EnvironmentPackager> = match &self.prepare_command {
            Some(command) => Arc::new(CommandPackager::new(command.clone())),
            None => Arc::new(NoopPackager),
        };

        let run = OrchestrationRun::new(
            Arc::new(self.client()?),
            self.template(),
            self.policy(),
            Arc::new(JsonFileDescriptorSource::new(&self.descriptors_path)),
            Arc::new(JsonReportSink::new(&self.report_path)),
        )
        .with_packager(packager)
        .with_test_mode(self.test_mode);

        Ok(run)
    }

    fn passthrough_values(&self) -> BTreeMap<String, String> {
        self.passthrough_env
            .iter()
            .filter_map(|name| {
                std::env::var(name)
                    .ok()
                    .map(|value| (name.clone(), value))
            })
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            "http://localhost:8080".to_string(),
            "autobatch".to_string(),
            "default".to_string(),
        )
    }
}

fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, raw, e)),
        Err(_) => Ok(None),
    }
}

fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
