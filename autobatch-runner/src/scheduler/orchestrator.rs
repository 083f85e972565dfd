//! Batch orchestrator
//!
//! Drives one run through submit → monitor → verify. Every exit other than a
//! clean completion asks the backend to terminate whatever is still live.

use autobatch_client::{BackendClient, ClientError};
use autobatch_core::domain::descriptor::JobDescriptor;
use autobatch_core::domain::job::{JobHandle, JobStatus, OrchestrationResult};
use autobatch_core::domain::policy::RunPolicy;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::breaker::{self, StatusTally};
use super::job_set::JobSet;
use super::template::JobTemplate;

const DEADLINE_REASON: &str = "Impending worker timeout, so killing live tasks";
const UNEXPLAINED_REASON: &str = "Jobs should no longer be running";
const SUBMISSION_REASON: &str = "Submission failed, abandoning batch";
const DUPLICATE_REASON: &str = "Backend reused a job handle, abandoning batch";

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Completed,
    DeadlineExceeded,
    FailureThresholdBreached,
    /// Stopped by a submission error or a backend inconsistency
    Aborted,
}

/// Run-level failures
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to submit descriptor {index}: {source}")]
    Submission {
        index: usize,
        #[source]
        source: ClientError,
    },

    #[error("deadline {deadline} exceeded, terminated {terminated} job(s)")]
    DeadlineExceeded {
        deadline: DateTime<Utc>,
        terminated: usize,
    },

    #[error(
        "failure rate {}% exceeds tolerated {}%, terminated {terminated} job(s)",
        (.failure_rate * 100.0) as u32,
        (.threshold * 100.0).round() as u32
    )]
    FailureThresholdBreached {
        failure_rate: f64,
        threshold: f64,
        terminated: usize,
    },

    #[error("{} job(s) still not terminal after monitoring finished", .handles.len())]
    UnexplainedJobs { handles: Vec<JobHandle> },

    #[error("backend returned handle {handle} for descriptor {index}, already tracked")]
    DuplicateHandle { index: usize, handle: JobHandle },
}

impl OrchestratorError {
    /// Terminal run state this error corresponds to
    pub fn state(&self) -> RunState {
        match self {
            OrchestratorError::DeadlineExceeded { .. } => RunState::DeadlineExceeded,
            OrchestratorError::FailureThresholdBreached { .. } => {
                RunState::FailureThresholdBreached
            }
            OrchestratorError::Submission { .. }
            | OrchestratorError::UnexplainedJobs { .. }
            | OrchestratorError::DuplicateHandle { .. } => RunState::Aborted,
        }
    }
}

/// Submits and monitors one batch of jobs
pub struct Orchestrator {
    backend: Arc<dyn BackendClient>,
    template: JobTemplate,
    policy: RunPolicy,
    jobs: JobSet,
    state: RunState,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn BackendClient>, template: JobTemplate, policy: RunPolicy) -> Self {
        Self {
            backend,
            template,
            policy,
            jobs: JobSet::new(),
            state: RunState::Running,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn policy(&self) -> &RunPolicy {
        &self.policy
    }

    /// Bookkeeping of the current or last run
    pub fn jobs(&self) -> &JobSet {
        &self.jobs
    }

    /// Runs the whole batch
    ///
    /// Returns one result per submitted job once every job is terminal and
    /// the failure rate is within policy.
    pub async fn execute(
        &mut self,
        descriptors: &[JobDescriptor],
    ) -> Result<Vec<OrchestrationResult>, OrchestratorError> {
        self.jobs = JobSet::new();
        self.state = RunState::Running;

        let outcome = self.drive(descriptors).await;
        self.state = match &outcome {
            Ok(()) => RunState::Completed,
            Err(e) => e.state(),
        };

        match outcome {
            Ok(()) => {
                info!("Run completed: {} job(s) terminal", self.jobs.len());
                Ok(self.jobs.results())
            }
            Err(e) => {
                error!("Run failed: {}", e);
                Err(e)
            }
        }
    }

    async fn drive(&mut self, descriptors: &[JobDescriptor]) -> Result<(), OrchestratorError> {
        self.submit_all(descriptors).await?;
        self.monitor().await?;
        self.verify().await
    }

    /// Submission phase
    async fn submit_all(&mut self, descriptors: &[JobDescriptor]) -> Result<(), OrchestratorError> {
        let mut submitted = 0;

        for (index, descriptor) in descriptors.iter().enumerate() {
            self.check_deadline().await?;

            if descriptor.done {
                debug!("Descriptor {} already done, skipping", index);
                continue;
            }

            if let Some(max_runs) = self.policy.max_runs {
                if submitted >= max_runs {
                    info!(
                        "Reached max_runs={}, leaving remaining descriptors unsubmitted",
                        max_runs
                    );
                    break;
                }
            }

            let request = self.template.request_for(descriptor);
            let handle = match self.backend.submit(&request).await {
                Ok(handle) => handle,
                Err(source) => {
                    error!("Submission of descriptor {} rejected: {}", index, source);
                    self.terminate_outstanding(SUBMISSION_REASON).await;
                    return Err(OrchestratorError::Submission { index, source });
                }
            };

            if !self.jobs.insert(handle.clone(), index) {
                error!("Backend returned duplicate handle {} for descriptor {}", handle, index);
                self.terminate_outstanding(DUPLICATE_REASON).await;
                return Err(OrchestratorError::DuplicateHandle { index, handle });
            }
            debug!("Descriptor {} submitted as {}", index, handle);
            submitted += 1;
        }

        info!("Submitted {} job(s)", submitted);
        Ok(())
    }

    /// Monitoring phase
    async fn monitor(&mut self) -> Result<(), OrchestratorError> {
        while self.jobs.outstanding_count() > 0 {
            self.check_deadline().await?;

            let mut tally = StatusTally::default();
            for handle in self.jobs.outstanding() {
                let status = match self.backend.get_status(&handle).await {
                    Ok(status) => status,
                    Err(e) => {
                        warn!("Status query for {} failed, retrying next cycle: {}", handle, e);
                        continue;
                    }
                };
                debug!("{} {}", handle, status);

                if tally.record(status) {
                    self.jobs.record(&handle, status);
                }
            }

            if !tally.is_empty() {
                self.enforce_success_rate(&tally).await?;
            }

            let outstanding = self.jobs.outstanding_count();
            if outstanding == 0 {
                break;
            }

            info!(
                "Not finished yet: {}/{} job(s) outstanding",
                outstanding,
                self.jobs.len()
            );
            tokio::time::sleep(self.policy.poll_interval).await;
        }

        Ok(())
    }

    /// Re-checks every job once the monitoring loop believes the batch is done
    async fn verify(&mut self) -> Result<(), OrchestratorError> {
        let mut tally = StatusTally::default();
        let mut unexplained = Vec::new();

        for handle in self.jobs.handles() {
            match self.backend.get_status(&handle).await {
                Ok(status) if status.is_terminal() => {
                    debug!("{} {}", handle, status);
                    self.jobs.record(&handle, status);
                    tally.record(status);
                }
                Ok(status) => {
                    let previous = self.jobs.status(&handle).unwrap_or(JobStatus::Unknown);
                    warn!(
                        "{} reported {} after monitoring saw {}",
                        handle, status, previous
                    );
                    self.jobs.record(&handle, status);
                    unexplained.push(handle);
                }
                Err(e) => {
                    warn!("Final status query for {} failed: {}", handle, e);
                    unexplained.push(handle);
                }
            }
        }

        if !unexplained.is_empty() {
            self.terminate(&unexplained, UNEXPLAINED_REASON).await;
            return Err(OrchestratorError::UnexplainedJobs {
                handles: unexplained,
            });
        }

        self.enforce_success_rate(&tally).await
    }

    async fn check_deadline(&mut self) -> Result<(), OrchestratorError> {
        let now = Utc::now();
        warn!(
            "Timeout summary: now {}, deadline {}, {} seconds left",
            now,
            self.policy.deadline,
            self.policy.remaining_at(now).num_seconds()
        );

        if !self.policy.deadline_exceeded_at(now) {
            return Ok(());
        }

        let terminated = self.terminate_outstanding(DEADLINE_REASON).await;
        Err(OrchestratorError::DeadlineExceeded {
            deadline: self.policy.deadline,
            terminated,
        })
    }

    async fn enforce_success_rate(&mut self, tally: &StatusTally) -> Result<(), OrchestratorError> {
        let Some(failure_rate) = breaker::evaluate(tally, self.policy.success_rate) else {
            return Ok(());
        };

        let reason = breaker::breach_reason(failure_rate);
        warn!("{} ({:?})", reason, tally);
        let terminated = self.terminate_outstanding(&reason).await;

        Err(OrchestratorError::FailureThresholdBreached {
            failure_rate,
            threshold: self.policy.failure_threshold(),
            terminated,
        })
    }

    /// Terminates every handle not yet resolved; returns how many were asked
    async fn terminate_outstanding(&mut self, reason: &str) -> usize {
        let outstanding = self.jobs.outstanding();
        self.terminate(&outstanding, reason).await;
        outstanding.len()
    }

    async fn terminate(&mut self, handles: &[JobHandle], reason: &str) {
        if handles.is_empty() {
            return;
        }

        info!("Terminating {} job(s): {}", handles.len(), reason);
        if let Err(e) = self.backend.terminate(handles, reason).await {
            warn!("Termination was not fully acknowledged: {}", e);
        }
        self.jobs.mark_terminated(handles);
    }
}

/// Splits results into (succeeded, failed) counts
pub fn summarize(results: &[OrchestrationResult]) -> (usize, usize) {
    results.iter().fold((0, 0), |(ok, failed), result| match result.status {
        JobStatus::Succeeded => (ok + 1, failed),
        JobStatus::Failed => (ok, failed + 1),
        _ => (ok, failed),
    })
}
