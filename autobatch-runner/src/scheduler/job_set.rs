//! Job set
//!
//! In-memory bookkeeping of submitted jobs: the handle of every submission,
//! the last status observed for it, and which handles have resolved to a
//! terminal status. Only the orchestrator mutates it.

use autobatch_core::domain::job::{JobHandle, JobStatus, OrchestrationResult};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct TrackedJob {
    descriptor_index: usize,
    status: JobStatus,
    force_terminated: bool,
}

/// Submitted jobs and their last-observed statuses
#[derive(Debug, Default)]
pub struct JobSet {
    /// Handles in submission order
    order: Vec<JobHandle>,
    jobs: HashMap<JobHandle, TrackedJob>,
    /// Handles resolved to SUCCEEDED or FAILED; only ever grows
    done: HashSet<JobHandle>,
}

impl JobSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fresh submission with status SUBMITTED
    ///
    /// Returns false if the backend handed out a handle already tracked.
    pub fn insert(&mut self, handle: JobHandle, descriptor_index: usize) -> bool {
        if self.jobs.contains_key(&handle) {
            return false;
        }
        self.order.push(handle.clone());
        self.jobs.insert(
            handle,
            TrackedJob {
                descriptor_index,
                status: JobStatus::Submitted,
                force_terminated: false,
            },
        );
        true
    }

    /// Stores an observed status
    ///
    /// Terminal statuses move the handle into the done set. Returns true when
    /// the handle was newly resolved by this observation.
    pub fn record(&mut self, handle: &JobHandle, status: JobStatus) -> bool {
        let Some(job) = self.jobs.get_mut(handle) else {
            return false;
        };
        job.status = status;
        if status.is_terminal() {
            self.done.insert(handle.clone())
        } else {
            false
        }
    }

    /// Flags handles the orchestrator asked the backend to kill
    pub fn mark_terminated(&mut self, handles: &[JobHandle]) {
        for handle in handles {
            if let Some(job) = self.jobs.get_mut(handle) {
                job.force_terminated = true;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn done_count(&self) -> usize {
        self.done.len()
    }

    pub fn outstanding_count(&self) -> usize {
        self.len() - self.done_count()
    }

    /// Last status observed for a handle
    pub fn status(&self, handle: &JobHandle) -> Option<JobStatus> {
        self.jobs.get(handle).map(|job| job.status)
    }

    /// All handles, in submission order
    pub fn handles(&self) -> Vec<JobHandle> {
        self.order.clone()
    }

    /// Handles not yet resolved, in submission order
    pub fn outstanding(&self) -> Vec<JobHandle> {
        self.order
            .iter()
            .filter(|handle| !self.done.contains(*handle))
            .cloned()
            .collect()
    }

    /// One record per submitted job, in submission order
    pub fn results(&self) -> Vec<OrchestrationResult> {
        self.order
            .iter()
            .filter_map(|handle| {
                self.jobs.get(handle).map(|job| OrchestrationResult {
                    handle: handle.clone(),
                    descriptor_index: job.descriptor_index,
                    status: job.status,
                    force_terminated: job.force_terminated,
                })
            })
            .collect()
    }
}
