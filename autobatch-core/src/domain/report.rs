//! Run report domain types
//!
//! The descriptor list annotated with what happened to each entry, handed to
//! the workload's combine step once a run completes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::descriptor::JobDescriptor;
use super::job::{JobHandle, JobStatus, OrchestrationResult};

/// What the run did with one descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DescriptorOutcome {
    /// Marked `done` by the prepare step, never submitted
    Skipped,
    /// Left out by the submission cap or test mode
    NotRun,
    /// Submitted and observed to a terminal status
    Finished {
        handle: JobHandle,
        status: JobStatus,
        force_terminated: bool,
    },
}

/// A descriptor paired with its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDescriptor {
    pub descriptor: JobDescriptor,
    #[serde(flatten)]
    pub outcome: DescriptorOutcome,
}

impl AnnotatedDescriptor {
    pub fn succeeded(&self) -> bool {
        matches!(
            self.outcome,
            DescriptorOutcome::Finished {
                status: JobStatus::Succeeded,
                ..
            }
        )
    }
}

/// Summary of one completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub descriptors: Vec<AnnotatedDescriptor>,
}

/// Pairs every descriptor with its outcome
///
/// Descriptors with a matching result are `Finished`, `done` ones are
/// `Skipped`, and the rest were never reached.
pub fn annotate(
    descriptors: &[JobDescriptor],
    results: &[OrchestrationResult],
) -> Vec<AnnotatedDescriptor> {
    descriptors
        .iter()
        .enumerate()
        .map(|(index, descriptor)| {
            let outcome = match results.iter().find(|r| r.descriptor_index == index) {
                Some(result) => DescriptorOutcome::Finished {
                    handle: result.handle.clone(),
                    status: result.status,
                    force_terminated: result.force_terminated,
                },
                None if descriptor.done => DescriptorOutcome::Skipped,
                None => DescriptorOutcome::NotRun,
            };
            AnnotatedDescriptor {
                descriptor: descriptor.clone(),
                outcome,
            }
        })
        .collect()
}
