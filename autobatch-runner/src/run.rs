//! Orchestration run
//!
//! One end-to-end batch: prepare descriptors, publish the environment,
//! submit and monitor through the orchestrator, then hand the annotated
//! descriptors to the combine step. A failed orchestration never reaches
//! combine.

use autobatch_client::BackendClient;
use autobatch_core::domain::policy::RunPolicy;
use autobatch_core::domain::report::{RunReport, annotate};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::scheduler::orchestrator::summarize;
use crate::scheduler::template::ARTIFACT_ENV;
use crate::scheduler::{JobTemplate, Orchestrator, OrchestratorError};
use crate::service::{
    DescriptorSource, EnvironmentPackager, NoopPackager, ResultSink, ServiceError,
};

/// Descriptors considered in test mode
const TEST_MODE_LIMIT: usize = 2;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("prepare step failed: {0}")]
    Prepare(#[source] ServiceError),

    #[error("environment packaging failed: {0}")]
    Packaging(#[source] ServiceError),

    #[error(transparent)]
    Orchestration(#[from] OrchestratorError),

    #[error("combine step failed: {0}")]
    Combine(#[source] ServiceError),
}

/// A single batch, composed from a backend and workload collaborators
pub struct OrchestrationRun {
    backend: Arc<dyn BackendClient>,
    template: JobTemplate,
    policy: RunPolicy,
    source: Arc<dyn DescriptorSource>,
    sink: Arc<dyn ResultSink>,
    packager: Arc<dyn EnvironmentPackager>,
    test_mode: bool,
}

impl OrchestrationRun {
    pub fn new(
        backend: Arc<dyn BackendClient>,
        template: JobTemplate,
        policy: RunPolicy,
        source: Arc<dyn DescriptorSource>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            backend,
            template,
            policy,
            source,
            sink,
            packager: Arc::new(NoopPackager),
            test_mode: false,
        }
    }

    pub fn with_packager(mut self, packager: Arc<dyn EnvironmentPackager>) -> Self {
        self.packager = packager;
        self
    }

    /// Only the first two descriptors are considered
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub async fn execute(self) -> Result<RunReport, RunError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!("Starting run {}", run_id);

        let mut descriptors = self.source.prepare().await.map_err(RunError::Prepare)?;
        if self.test_mode && descriptors.len() > TEST_MODE_LIMIT {
            info!(
                "Test mode: keeping {} of {} descriptor(s)",
                TEST_MODE_LIMIT,
                descriptors.len()
            );
            descriptors.truncate(TEST_MODE_LIMIT);
        }

        let mut template = self.template;
        if let Some(reference) = self.packager.package().await.map_err(RunError::Packaging)? {
            template = template.with_env(ARTIFACT_ENV, reference);
        }

        let mut orchestrator = Orchestrator::new(self.backend, template, self.policy);
        let results = orchestrator.execute(&descriptors).await?;

        let (succeeded, failed) = summarize(&results);
        info!(
            "Run {} finished: {} succeeded, {} failed, {} not submitted",
            run_id,
            succeeded,
            failed,
            descriptors.len() - results.len()
        );

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            descriptors: annotate(&descriptors, &results),
        };
        self.sink.combine(&report).await.map_err(RunError::Combine)?;

        Ok(report)
    }
}
