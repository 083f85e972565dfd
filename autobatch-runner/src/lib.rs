//! Autobatch Runner
//!
//! Submits a batch of job descriptors to a compute backend, monitors every
//! job to a terminal state, and enforces a run deadline and a failure-rate
//! breaker across the whole batch.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Scheduler: The orchestrator state machine and its bookkeeping
//! - Services: Workload collaborators (prepare, package, combine)
//! - Run: One end-to-end batch composed from the pieces above

pub mod config;
pub mod run;
pub mod scheduler;
pub mod service;

pub use run::{OrchestrationRun, RunError};
pub use scheduler::{Orchestrator, OrchestratorError, RunState};
