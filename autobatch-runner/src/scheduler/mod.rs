//! Scheduler layer for the runner
//!
//! This layer submits descriptors to the backend, polls their status and
//! enforces the run's deadline and failure-rate policy. It manages the
//! lifecycle of every job from submission to a terminal state.

pub mod breaker;
pub mod job_set;
pub mod orchestrator;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use breaker::StatusTally;
pub use job_set::JobSet;
pub use orchestrator::{Orchestrator, OrchestratorError, RunState};
pub use template::JobTemplate;
